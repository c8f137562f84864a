//! SubprocessRegenerator — file-based handoff to the external generator.
//!
//! Protocol:
//! 1. write `[{Name, Email, Company, JobDescription}]` to a temp file
//! 2. run `<program> [script] <request-path> <address>`
//! 3. non-zero exit → `GenerationError::Exit`
//! 4. read the generator's output mapping and take the entry for `address`
//!
//! The output file holds every draft the generator has produced, not just this
//! one, so an unchanged modification time means the run did not write it.
//! Runs are serialized: the generator read-modify-writes that file, and the
//! freshness check only holds when no other run can touch it meanwhile.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::warn;

use crate::process::{log_output, output_tail, MAX_OUTPUT_TAIL_CHARS};
use crate::regeneration::request::GenerationRequest;
use crate::regeneration::{GenerationError, Regenerator};

#[derive(Debug)]
pub struct SubprocessRegenerator {
    program: String,
    script: Option<String>,
    output_path: PathBuf,
    timeout: Duration,
    /// Held from the pre-run mtime read until the output has been read back.
    run_lock: Mutex<()>,
}

impl SubprocessRegenerator {
    pub fn new(
        program: String,
        script: Option<String>,
        output_path: PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            program,
            script,
            output_path,
            timeout,
            run_lock: Mutex::new(()),
        }
    }

    fn write_request(&self, request: &GenerationRequest) -> Result<NamedTempFile, GenerationError> {
        let mut file = tempfile::Builder::new()
            .prefix("regenerate-")
            .suffix(".json")
            .tempfile()
            .map_err(GenerationError::Request)?;
        serde_json::to_writer(file.as_file_mut(), &[request])
            .map_err(|e| GenerationError::Request(e.into()))?;
        file.as_file_mut()
            .flush()
            .map_err(GenerationError::Request)?;
        Ok(file)
    }

    async fn read_output(&self, address: &str) -> Result<String, GenerationError> {
        let output_error = |message: String| GenerationError::Output {
            path: self.output_path.clone(),
            message,
        };
        let raw = tokio::fs::read_to_string(&self.output_path)
            .await
            .map_err(|e| output_error(e.to_string()))?;
        let mut drafts: BTreeMap<String, String> =
            serde_json::from_str(&raw).map_err(|e| output_error(e.to_string()))?;

        drafts
            .remove(address)
            .ok_or_else(|| GenerationError::MissingEntry(address.to_string()))
    }
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

#[async_trait]
impl Regenerator for SubprocessRegenerator {
    async fn regenerate(
        &self,
        address: &str,
        job_description: &str,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest::for_address(address, job_description);
        // Deleted when dropped, after the generator has finished with it.
        let request_file = self.write_request(&request)?;

        let _run = self.run_lock.lock().await;
        let before = modified_at(&self.output_path).await;

        let mut command = Command::new(&self.program);
        if let Some(script) = &self.script {
            command.arg(script);
        }
        command
            .arg(request_file.path())
            .arg(address)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(GenerationError::Spawn)?;
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))?
            .map_err(GenerationError::Spawn)?;

        log_output("generator", "stdout", &output.stdout);
        log_output("generator", "stderr", &output.stderr);

        if !output.status.success() {
            return Err(GenerationError::Exit {
                code: output.status.code(),
                stderr: output_tail(&output.stderr, MAX_OUTPUT_TAIL_CHARS),
            });
        }

        let after = modified_at(&self.output_path).await;
        if before.is_some() && after == before {
            warn!(
                "Generator exited cleanly but did not rewrite {}",
                self.output_path.display()
            );
            return Err(GenerationError::StaleOutput(self.output_path.clone()));
        }

        self.read_output(address).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        /// Writes a generator script; `$OUT` and `$DIR` are substituted.
        fn regenerator(&self, body: &str, timeout: Duration) -> SubprocessRegenerator {
            let script = self.path("generate.sh");
            let body = body
                .replace("$OUT", &self.path("out.json").display().to_string())
                .replace("$DIR", &self.dir.path().display().to_string());
            std::fs::write(&script, body).unwrap();
            SubprocessRegenerator::new(
                "sh".to_string(),
                Some(script.display().to_string()),
                self.path("out.json"),
                timeout,
            )
        }
    }

    #[tokio::test]
    async fn test_success_reads_entry_and_sends_request_file() {
        let fx = Fixture::new();
        let regen = fx.regenerator(
            r#"cp "$1" "$DIR/request_copy.json"
printf '{"other@x.com": "untouched", "%s": "<p>Regenerated</p>"}' "$2" > "$OUT"
echo "[SUCCESS] Generated email for $2"
"#,
            Duration::from_secs(10),
        );

        let content = regen.regenerate("jane@co.com", "Build widgets").await.unwrap();
        assert_eq!(content, "<p>Regenerated</p>");

        let request: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(fx.path("request_copy.json")).unwrap())
                .unwrap();
        assert_eq!(request[0]["Email"], "jane@co.com");
        assert_eq!(request[0]["Name"], "Jane");
        assert_eq!(request[0]["JobDescription"], "Build widgets");
    }

    #[tokio::test]
    async fn test_non_zero_exit_carries_code_and_stderr() {
        let fx = Fixture::new();
        let regen = fx.regenerator("echo 'API key missing' >&2\nexit 1\n", Duration::from_secs(10));

        match regen.regenerate("jane@co.com", "jd").await {
            Err(GenerationError::Exit { code, stderr }) => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("API key missing"), "stderr was {stderr}");
            }
            other => panic!("expected exit error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let fx = Fixture::new();
        let regen = fx.regenerator(
            "printf '{\"other@x.com\": \"x\"}' > \"$OUT\"\n",
            Duration::from_secs(10),
        );
        assert!(matches!(
            regen.regenerate("jane@co.com", "jd").await,
            Err(GenerationError::MissingEntry(_))
        ));
    }

    #[tokio::test]
    async fn test_untouched_output_is_stale() {
        let fx = Fixture::new();
        std::fs::write(fx.path("out.json"), r#"{"jane@co.com": "old draft"}"#).unwrap();
        let regen = fx.regenerator("exit 0\n", Duration::from_secs(10));

        assert!(matches!(
            regen.regenerate("jane@co.com", "jd").await,
            Err(GenerationError::StaleOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_not_mask_stale_output() {
        let fx = Fixture::new();
        let out = fx.path("out.json");
        std::fs::write(&out, r#"{"a@x.com": "OLD A", "b@x.com": "OLD B"}"#).unwrap();
        std::fs::File::options()
            .write(true)
            .open(&out)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(60))
            .unwrap();
        let regen = fx.regenerator(
            r#"if [ "$2" = "a@x.com" ]; then
  sleep 0.5
  exit 0
fi
printf '{"a@x.com": "OLD A", "b@x.com": "NEW B"}' > "$OUT"
"#,
            Duration::from_secs(10),
        );

        let (a, b) = tokio::join!(
            regen.regenerate("a@x.com", "jd a"),
            regen.regenerate("b@x.com", "jd b"),
        );
        assert!(
            matches!(a, Err(GenerationError::StaleOutput(_))),
            "a was {a:?}"
        );
        assert_eq!(b.unwrap(), "NEW B");
    }

    #[tokio::test]
    async fn test_malformed_output() {
        let fx = Fixture::new();
        let regen = fx.regenerator("echo 'not json' > \"$OUT\"\n", Duration::from_secs(10));
        assert!(matches!(
            regen.regenerate("jane@co.com", "jd").await,
            Err(GenerationError::Output { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_kills_generator() {
        let fx = Fixture::new();
        let regen = fx.regenerator("sleep 5\n", Duration::from_millis(200));
        assert!(matches!(
            regen.regenerate("jane@co.com", "jd").await,
            Err(GenerationError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let regen = SubprocessRegenerator::new(
            "definitely-not-a-real-generator".to_string(),
            None,
            PathBuf::from("unused.json"),
            Duration::from_secs(1),
        );
        assert!(matches!(
            regen.regenerate("jane@co.com", "jd").await,
            Err(GenerationError::Spawn(_))
        ));
    }
}
