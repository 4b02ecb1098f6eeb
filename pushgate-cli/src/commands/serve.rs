//! Implementation of the `pushgate serve` command.

use colored::Colorize;
use pushgate::config::ServiceConfig;
use pushgate::metrics::RequestMetrics;
use pushgate::push::Pusher;
use pushgate::users;

#[derive(Debug, Default)]
pub struct ServeOverrides {
    pub listen: Option<String>,
    pub job: Option<String>,
    pub no_startup_push: bool,
}

impl ServeOverrides {
    fn apply(self, config: &mut ServiceConfig) {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(job) = self.job {
            config.job = job;
        }
        if self.no_startup_push {
            config.startup_push = false;
        }
    }
}

/// Serves `POST /users` behind the timing middleware until Ctrl-C.
pub async fn execute(overrides: ServeOverrides) -> Result<(), String> {
    let mut config = ServiceConfig::from_env().map_err(|e| e.to_string())?;
    overrides.apply(&mut config);

    let pusher = Pusher::new(&config.gateway.host, &config.job).map_err(|e| e.to_string())?;
    let startup_push = config.startup_push.then_some(&pusher);

    let app = users::build(RequestMetrics::new(), startup_push).await;

    println!(
        "  {} Listening on {}",
        "→".cyan(),
        format!("http://{}", config.listen).cyan()
    );
    println!("  {} POST /users", "•".dimmed());
    println!();

    app.listen(&config.listen)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushgate::config::GatewayConfig;

    fn config() -> ServiceConfig {
        ServiceConfig {
            gateway: GatewayConfig {
                host: "localhost:9091".to_string(),
            },
            job: "request_timing".to_string(),
            listen: "127.0.0.1:3000".to_string(),
            startup_push: true,
        }
    }

    #[test]
    fn test_no_startup_push_flag() {
        let mut config = config();
        ServeOverrides {
            no_startup_push: true,
            ..Default::default()
        }
        .apply(&mut config);

        assert!(!config.startup_push);
        assert_eq!(config.listen, "127.0.0.1:3000");
    }

    #[test]
    fn test_listen_and_job_overrides() {
        let mut config = config();
        ServeOverrides {
            listen: Some("0.0.0.0:8080".into()),
            job: Some("users_api".into()),
            no_startup_push: false,
        }
        .apply(&mut config);

        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.job, "users_api");
        assert!(config.startup_push);
    }
}
