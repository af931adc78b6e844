use color_eyre::Result;
use ulid::Ulid;

use super::models::AuthUser;
use super::Db;

impl Db {
    pub async fn create_user(&self, username: &str, email: &str) -> Result<i64> {
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, email) VALUES (?, ?) RETURNING id",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("new user created: id={user_id}, username={username}");
        Ok(user_id)
    }

    /// Issue a bearer token for the authoring API.
    pub async fn create_user_token(&self, user_id: i64) -> Result<String> {
        let token = Ulid::new().to_string();

        sqlx::query("INSERT INTO user_tokens (id, user_id) VALUES (?, ?)")
            .bind(&token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("new api token created for user_id={user_id}");
        Ok(token)
    }

    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<AuthUser>> {
        let user = sqlx::query_as::<_, AuthUser>(
            r#"
            SELECT u.id, u.username, u.email
            FROM user_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.id = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
