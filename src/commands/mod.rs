mod enroll;
mod offering;
mod person;
mod sync_cmd;

pub use enroll::EnrollCommand;
pub use offering::OfferingCommand;
pub use person::PersonCommand;
pub use sync_cmd::{run_reload, run_watch};

use clap::ValueEnum;

use aulanet_core::{Gateway, HttpRemote, ReloadCoordinator, SharedStore};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A populated replica cache plus the handles the commands mutate
/// through.
pub struct Context {
    pub store: SharedStore,
    pub gateway: Gateway<HttpRemote>,
    pub reload: ReloadCoordinator<HttpRemote>,
}

impl Context {
    /// Connects to the records service and loads the initial snapshot.
    pub async fn connect(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let (server_url, api_key) = config.require_connection()?;
        let remote = HttpRemote::new(&server_url, &api_key);

        let store = SharedStore::new();
        let reload = ReloadCoordinator::new(store.clone(), remote.clone());
        reload.force_reload().await?;

        let gateway = Gateway::new(store.clone(), remote);
        Ok(Self {
            store,
            gateway,
            reload,
        })
    }
}
