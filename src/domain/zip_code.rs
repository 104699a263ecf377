/// A five-digit US zip code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(s: &str) -> Result<ZipCode, String> {
        let s = s.trim();
        if s.len() == 5 && s.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!("{} is not a valid 5-digit zip code.", s))
        }
    }

    pub fn is_serviced(&self) -> bool {
        SERVICE_ZIP_CODES.contains(&self.0.as_str())
    }
}

impl AsRef<str> for ZipCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Zip codes served in the Phoenix metro area.
const SERVICE_ZIP_CODES: &[&str] = &[
    // Tempe
    "85281", "85282", "85283", "85284", "85285", "85287",
    // Scottsdale
    "85250", "85251", "85252", "85253", "85254", "85255", "85256", "85257", "85258", "85259",
    "85260", "85261", "85262", "85266", "85267", "85271",
    // Gilbert
    "85233", "85234", "85295", "85296", "85297", "85298", "85299",
    // Mesa
    "85201", "85202", "85203", "85204", "85205", "85206", "85207", "85208", "85209", "85210",
    "85211", "85212", "85213", "85214", "85215", "85216",
    // Chandler
    "85224", "85225", "85226", "85244", "85246", "85248", "85249",
];

/// A phone number with at least ten digits. Formatting characters are kept
/// as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_DIGITS: usize = 10;

    pub fn parse(s: &str) -> Result<PhoneNumber, String> {
        let s = s.trim();
        let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
        let allowed = |c: char| c.is_ascii_digit() || " +-().".contains(c);
        if digits >= Self::MIN_DIGITS && s.chars().all(allowed) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!("{} is not a valid phone number.", s))
        }
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
