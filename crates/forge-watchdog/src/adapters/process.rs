//! Script download and execution on the host.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::domain::CommandOutput;
use crate::error::{Result, WatchdogError};
use crate::ports::ActionExecutor;

/// Executable permissions for downloaded scripts
const SCRIPT_MODE: u32 = 0o755;

pub struct SystemActionExecutor {
    client: Client,
}

impl SystemActionExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActionExecutor for SystemActionExecutor {
    async fn fetch_script(&self, url: &str, dest: &Path) -> Result<()> {
        // A stale copy may or may not exist.
        if let Err(e) = tokio::fs::remove_file(dest).await {
            debug!(path = %dest.display(), error = %e, "No previous script removed");
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WatchdogError::http(url, e))?;
        let write_err =
            |e: std::io::Error| WatchdogError::io(format!("writing {}", dest.display()), e);
        let mut file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| WatchdogError::http(url, e))?
        {
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(dest, std::fs::Permissions::from_mode(SCRIPT_MODE))
                .await
                .map_err(|e| WatchdogError::io(format!("chmod {}", dest.display()), e))?;
        }

        debug!(path = %dest.display(), bytes = written, "Script downloaded");
        Ok(())
    }

    async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| WatchdogError::io(format!("running {}", program.display()), e))?;
        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::adapters::build_client;
    use std::os::unix::fs::PermissionsExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const INSTALLER: &str = "#!/bin/sh\necho installed\n";

    fn executor() -> SystemActionExecutor {
        SystemActionExecutor::new(build_client().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_replaces_and_marks_executable() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("installLisk.sh");
        std::fs::write(&dest, "old contents that are longer than the new script").unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lisk/test/installLisk.sh"))
            .respond_with(ResponseTemplate::new(200).set_body_string(INSTALLER))
            .expect(1)
            .mount(&server)
            .await;

        executor()
            .fetch_script(&format!("{}/lisk/test/installLisk.sh", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), INSTALLER);
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, SCRIPT_MODE);
    }

    #[tokio::test]
    async fn test_fetch_writes_large_body_completely() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("installLisk.sh");
        let body = "echo step\n".repeat(50_000);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
            .mount(&server)
            .await;

        executor().fetch_script(&server.uri(), &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_http_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dest = dir.path().join("installLisk.sh");
        let err = executor().fetch_script(&server.uri(), &dest).await.unwrap_err();
        assert!(matches!(err, WatchdogError::Http { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_run_captures_output_and_exit_code() {
        let out = executor()
            .run(
                Path::new("/bin/sh"),
                &["-c".to_string(), "echo reloaded; echo warn >&2; exit 3".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout, "reloaded\n");
        assert_eq!(out.stderr, "warn\n");
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let err = executor()
            .run(Path::new("/nonexistent/lisk.sh"), &["reload".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, WatchdogError::Io { .. }));
    }
}
