//! One-shot MongoDB user provisioning
//!
//! Usage:
//!   cargo run --bin provision_mongo
//!
//! Environment:
//!   MONGODB_URL            - Admin connection (default: mongodb://localhost:27017)
//!   MONGODB_DB             - Database the user is created on
//!   MONGODB_TEST_USERNAME1 - User name
//!   MONGODB_TEST_PASSWORD1 - Password
//!   MONGODB_TEST_ROLE1     - Single role granted on MONGODB_DB

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use todo_list::providers::{admin_url_from_env, connect_client, provision_user, MongoUserSpec};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let spec = match MongoUserSpec::from_env() {
        Ok(spec) => spec,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let client = connect_client(&admin_url_from_env()).await?;
    provision_user(&client, &spec).await?;

    info!("Provisioning finished for {}", spec.username);
    Ok(())
}
