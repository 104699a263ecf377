use uuid::Uuid;

#[derive(Queryable)]
pub struct OperatorRow {
    pub operator_id: Uuid,
    pub username: String,
    pub password_hash: String,
}
