use crate::utils::applescript::shell_escape;

/// Marker phrase `venti status` prints while a maintain directive is active.
pub const MAINTAINED_MARKER: &str = "being maintained at";

/// Builds command lines for the `venti` CLI.
///
/// Every subcommand is expected to be idempotent, so callers may repeat
/// them freely.
#[derive(Debug, Clone)]
pub struct VentiCli {
    binary: String,
}

impl VentiCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn sub(&self, args: &str) -> String {
        format!("{} {}", shell_escape(&self.binary), args)
    }

    pub fn maintain(&self, percentage: u8) -> String {
        self.sub(&format!("maintain {}", percentage))
    }

    pub fn maintain_stop(&self) -> String {
        self.sub("maintain stop")
    }

    pub fn status(&self) -> String {
        self.sub("status")
    }

    pub fn status_csv(&self) -> String {
        self.sub("status_csv")
    }

    pub fn update_silent(&self) -> String {
        self.sub("update silent")
    }

    pub fn set_api_key(&self, key: &str) -> String {
        self.sub(&format!("set-api-key {}", shell_escape(key)))
    }

    /// Regex for `ps`/`pkill -f` that matches running venti processes but not
    /// the shell executing the pattern itself.
    pub fn process_pattern(&self) -> String {
        let mut pattern = self.binary.clone();
        match pattern.pop() {
            Some(last) => format!("{}[{}]", pattern, last),
            None => String::new(),
        }
    }

    pub fn count_processes(&self) -> String {
        format!(
            "ps aux | grep {} | wc -l | tr -d ' '",
            shell_escape(&format!("{} ", self.process_pattern()))
        )
    }

    pub fn kill_processes(&self) -> String {
        format!("pkill -f {}", shell_escape(&self.process_pattern()))
    }
}

/// Whether free-text `venti status` output reports an active maintain
/// directive. Coupled to venti's exact wording.
pub fn status_indicates_limiter(message: &str) -> bool {
    message.contains(MAINTAINED_MARKER)
}

/// Whether `which <tool>` printed a path.
pub fn which_found(output: &str) -> bool {
    output.lines().any(|l| l.trim_start().starts_with('/'))
}
