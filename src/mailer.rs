use async_trait::async_trait;
use tracing::info;

/// Outbound mail seam. Real delivery lives behind this trait so the
/// forgot-password flow can be exercised without an SMTP relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, email: &str, token: &str) -> anyhow::Result<()>;
}

/// Writes the reset token to the log instead of delivering mail. Good enough
/// for development; deployments swap in a real transport here.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &str, token: &str) -> anyhow::Result<()> {
        info!(%email, %token, "password reset requested");
        Ok(())
    }
}
