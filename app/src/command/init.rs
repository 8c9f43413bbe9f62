use askflow_config::Config;

/// Strategy for initializing the configuration.
///
/// Creates the template at `~/askflow/config.json`; an existing file is
/// never overwritten.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        Config::create_config()
    }
}
