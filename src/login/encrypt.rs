//! Hand-off of the url-encoded sign-in form to the site's JavaScript cipher.
//!
//! The sign-in API only accepts the body produced by function `Q` of the
//! site's obfuscated `encrypt.js`. Rather than port it, the form is piped
//! through a JavaScript interpreter running that script.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::ClientError;

/// Turns the url-encoded form into the request body.
#[async_trait]
pub trait FormEncryptor: Send + Sync {
    /// Encrypts `form`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encrypt`] when the cipher cannot run.
    async fn encrypt(&self, form: &str) -> Result<String, ClientError>;
}

/// Sends the form unchanged.
///
/// Useful against endpoints that take the plain form (mirrors, test servers).
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainEncryptor;

#[async_trait]
impl FormEncryptor for PlainEncryptor {
    async fn encrypt(&self, form: &str) -> Result<String, ClientError> {
        Ok(form.to_string())
    }
}

/// Loads the script into a fresh `vm` context, calls `Q` on stdin, prints the result.
const NODE_BRIDGE: &str = r"
const fs = require('fs');
const vm = require('vm');
const context = vm.createContext({});
context.window = context;
vm.runInContext(fs.readFileSync(process.argv[1], 'utf8'), context);
if (typeof context.Q !== 'function') {
  process.stderr.write('script does not define function Q');
  process.exit(2);
}
let input = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', (chunk) => { input += chunk; });
process.stdin.on('end', () => { process.stdout.write(String(context.Q(input))); });
";

/// Runs `encrypt.js` under Node.js.
#[derive(Debug, Clone)]
pub struct NodeEncryptor {
    script: PathBuf,
    node: PathBuf,
}

impl NodeEncryptor {
    /// Uses `node` from `PATH` with the given script.
    #[must_use]
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            node: PathBuf::from("node"),
        }
    }

    /// Overrides the interpreter binary.
    #[must_use]
    pub fn with_interpreter(mut self, node: impl Into<PathBuf>) -> Self {
        self.node = node.into();
        self
    }
}

#[async_trait]
impl FormEncryptor for NodeEncryptor {
    #[instrument(level = "debug", skip(self, form), fields(script = %self.script.display()))]
    async fn encrypt(&self, form: &str) -> Result<String, ClientError> {
        if !self.script.is_file() {
            return Err(ClientError::encrypt(format!(
                "cipher script not found at {}",
                self.script.display()
            )));
        }

        let mut child = Command::new(&self.node)
            .arg("-e")
            .arg(NODE_BRIDGE)
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ClientError::encrypt(format!("cannot start {}: {e}", self.node.display()))
            })?;

        // node may exit before reading; its stderr is reported below.
        // Dropping stdin closes the pipe so the script sees 'end'.
        let write_error = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(form.as_bytes()).await.err(),
            None => None,
        };

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ClientError::encrypt(format!("cipher did not finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::encrypt(format!(
                "cipher exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if let Some(e) = write_error {
            return Err(ClientError::encrypt(format!("cannot write form to cipher: {e}")));
        }

        let body = String::from_utf8(output.stdout)
            .map_err(|_| ClientError::encrypt("cipher output is not UTF-8"))?;
        let body = body.trim().to_string();
        if body.is_empty() {
            return Err(ClientError::encrypt("cipher returned an empty body"));
        }
        debug!(bytes = body.len(), "form encrypted");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_encryptor_is_identity() {
        let body = PlainEncryptor.encrypt("a=1&b=2").await.unwrap();
        assert_eq!(body, "a=1&b=2");
    }

    #[tokio::test]
    async fn test_node_encryptor_missing_script_is_encrypt_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let encryptor = NodeEncryptor::new(dir.path().join("encrypt.js"));
        let err = encryptor.encrypt("a=1").await.unwrap_err();
        assert!(matches!(err, ClientError::Encrypt { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_node_encryptor_missing_interpreter_is_encrypt_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("encrypt.js");
        std::fs::write(&script, "function Q(s) { return s; }").unwrap();

        let encryptor =
            NodeEncryptor::new(&script).with_interpreter(dir.path().join("no-such-node"));
        let err = encryptor.encrypt("a=1").await.unwrap_err();
        assert!(err.to_string().contains("cannot start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_interpreter_exiting_before_reading_reports_exit_status() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("encrypt.js");
        std::fs::write(&script, "function Q(s) { return s; }").unwrap();

        // sh cannot open the bridge source as a file and exits without reading stdin
        let encryptor = NodeEncryptor::new(&script).with_interpreter("sh");
        let form = "a".repeat(1 << 20);
        let err = encryptor.encrypt(&form).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("cipher exited with"), "{message}");
        assert!(!message.contains("cannot write form"), "{message}");
    }
}
