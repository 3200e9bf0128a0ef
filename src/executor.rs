use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use anyhow::{Result, bail};
use log::info;
use regex::Regex;
use crate::config::GeneralConfig;
use crate::model::DesktopEntry;

static FIELD_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%[fFuUdDnNickvm]").expect("valid field code pattern")
});

/// What to run. Spawning it is the [`Launcher`]'s job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

pub trait Launcher {
    fn launch(&self, cmd: &LaunchCommand) -> Result<()>;
}

/// Drops `%f`-style field codes and unescapes `%%`.
pub fn strip_field_codes(exec: &str) -> String {
    exec.split("%%")
        .map(|part| FIELD_CODE.replace_all(part, "").into_owned())
        .collect::<Vec<_>>()
        .join("%")
}

/// Splits an Exec value into arguments. Double quotes group an argument;
/// inside them a backslash escapes `"`, `` ` ``, `$` and `\`.
pub fn split_exec(exec: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quoted = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                in_arg = true;
            }
            '\\' if quoted => match chars.next() {
                Some(next @ ('"' | '`' | '$' | '\\')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            c if c.is_whitespace() && !quoted => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            c => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

pub fn resolve_entry(entry: &DesktopEntry, config: &GeneralConfig) -> Option<LaunchCommand> {
    let exec = strip_field_codes(&entry.exec);
    let mut cmd_parts: Vec<String> = Vec::new();

    if entry.terminal {
        cmd_parts.extend(config.terminal.split_whitespace().map(str::to_string));
        cmd_parts.push("-e".to_string());
    }
    cmd_parts.extend(split_exec(&exec));

    // a terminal with nothing to run is not a launch
    if exec.trim().is_empty() || cmd_parts.is_empty() {
        return None;
    }

    let program = cmd_parts.remove(0);
    Some(LaunchCommand { program, args: cmd_parts })
}

/// Directories open in the file manager, anything else through `xdg-open`.
pub fn resolve_path(path: &Path, config: &GeneralConfig) -> LaunchCommand {
    let mut parts = if path.is_dir() {
        config.file_manager.split_whitespace().map(str::to_string).collect::<Vec<_>>()
    } else {
        vec!["xdg-open".to_string()]
    };
    if parts.is_empty() {
        parts.push("xdg-open".to_string());
    }
    let program = parts.remove(0);
    parts.push(path.to_string_lossy().into_owned());
    LaunchCommand { program, args: parts }
}

pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, cmd: &LaunchCommand) -> Result<()> {
        if cmd.program.is_empty() {
            bail!("empty command");
        }
        info!("Launching {} {:?}", cmd.program, cmd.args);

        Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::entry;
    use tempfile::TempDir;

    fn cmd(program: &str, args: &[&str]) -> LaunchCommand {
        LaunchCommand {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_strip_field_codes() {
        assert_eq!(strip_field_codes("firefox %u").trim(), "firefox");
        assert_eq!(strip_field_codes("gimp-2.10 %U"), "gimp-2.10 ");
        assert_eq!(strip_field_codes("printf 100%% %f"), "printf 100% ");
        assert_eq!(strip_field_codes("app --name=%c --icon %i"), "app --name= --icon ");
    }

    #[test]
    fn test_resolve_entry() {
        let config = GeneralConfig::default();
        let mut e = entry("fx.desktop", "Firefox", "", &[]);
        e.exec = "firefox --new-window %u".to_string();
        assert_eq!(resolve_entry(&e, &config), Some(cmd("firefox", &["--new-window"])));
    }

    #[test]
    fn test_split_exec_keeps_quoted_arguments() {
        assert_eq!(split_exec(r#"sh -c "a b""#), vec!["sh", "-c", "a b"]);
        assert_eq!(
            split_exec(r#"run "say \"hi\" \$HOME" "" x"#),
            vec!["run", r#"say "hi" $HOME"#, "", "x"]
        );
        assert_eq!(split_exec(r#""/opt/My App/bin"  --flag"#), vec!["/opt/My App/bin", "--flag"]);
        assert!(split_exec("   ").is_empty());

        let mut e = entry("sh.desktop", "Shell", "", &[]);
        e.exec = r#"sh -c "echo a b" %u"#.to_string();
        assert_eq!(
            resolve_entry(&e, &GeneralConfig::default()),
            Some(cmd("sh", &["-c", "echo a b"]))
        );
    }

    #[test]
    fn test_resolve_terminal_entry() {
        let config = GeneralConfig {
            terminal: "foot --app-id menu".to_string(),
            ..GeneralConfig::default()
        };
        let mut e = entry("htop.desktop", "htop", "", &[]);
        e.exec = "htop".to_string();
        e.terminal = true;
        assert_eq!(
            resolve_entry(&e, &config),
            Some(cmd("foot", &["--app-id", "menu", "-e", "htop"]))
        );
    }

    #[test]
    fn test_resolve_empty_exec() {
        let mut e = entry("x.desktop", "X", "", &[]);
        e.exec = "%F".to_string();
        e.terminal = true;
        assert_eq!(resolve_entry(&e, &GeneralConfig::default()), None);
    }

    #[test]
    fn test_resolve_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "").unwrap();
        let config = GeneralConfig::default();

        let opened = resolve_path(dir.path(), &config);
        assert_eq!(opened.program, "thunar");
        let opened = resolve_path(&file, &config);
        assert_eq!(opened.program, "xdg-open");
        assert_eq!(opened.args, vec![file.to_string_lossy().into_owned()]);
    }
}
