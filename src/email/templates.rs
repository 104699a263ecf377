//! Customer notification emails.

const SIGNATURE: &str = "\u{2014}\nThe Fresh Folds Team\nLaundry day, handled.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: &'static str,
    pub text: String,
}

pub fn subscription_welcome(
    customer_name: &str,
    pickup_day: &str,
    first_pickup_date: &str,
) -> Notification {
    Notification {
        subject: "Welcome to Fresh Folds! \u{1F389}",
        text: format!(
            "Hi {customer_name},\n\n\
             Welcome to Fresh Folds! We're so excited to have you.\n\n\
             Here's what happens next:\n\n\
             1. Your Fresh Folds kit (weather-resistant bags) will arrive within 3-5 business days\n\
             2. Your first pickup is scheduled for {first_pickup_date}\n\
             3. Fill your bags and set them on your porch by your pickup window\n\
             4. We'll take care of the rest!\n\n\
             Your regular pickup day: {pickup_day}\n\n\
             Questions? Just reply to this email.\n\n\
             {SIGNATURE}"
        ),
    }
}

pub fn subscription_paused(customer_name: &str) -> Notification {
    Notification {
        subject: "Your Fresh Folds subscription is paused",
        text: format!(
            "Hi {customer_name},\n\n\
             Your Fresh Folds subscription has been paused.\n\n\
             We'll keep your spot warm! You can resume anytime from your dashboard.\n\n\
             Miss us already? Log in to resume your subscription.\n\n\
             {SIGNATURE}"
        ),
    }
}

pub fn subscription_cancelled(customer_name: &str) -> Notification {
    Notification {
        subject: "We're sorry to see you go",
        text: format!(
            "Hi {customer_name},\n\n\
             Your Fresh Folds subscription has been cancelled.\n\n\
             We're sorry to see you go. If there's anything we could have done better, \
             please let us know by replying to this email.\n\n\
             Changed your mind? You can always sign up again at freshfolds.com.\n\n\
             \u{2014}\nThe Fresh Folds Team"
        ),
    }
}

pub fn payment_failed(customer_name: &str) -> Notification {
    Notification {
        subject: "We couldn't process your Fresh Folds payment",
        text: format!(
            "Hi {customer_name},\n\n\
             We tried to charge your card for your Fresh Folds subscription, but the payment \
             didn't go through.\n\n\
             Please update your payment method so your pickups continue without interruption.\n\n\
             {SIGNATURE}"
        ),
    }
}

pub fn wrap_in_html(content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>Fresh Folds</title>\n</head>\n\
         <body style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333; \
         max-width: 600px; margin: 0 auto; padding: 20px;\">\n  \
         <div style=\"white-space: pre-line;\">\n{}\n  </div>\n</body>\n</html>",
        escape_html(content)
    )
}

fn escape_html(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
