//! Line-oriented command loop.

use kvfts_core::Host;
use std::io::{BufRead, Write};

const PROMPT: &str = "kvfts> ";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Line {
    Empty,
    Quit,
    Help,
    Command(Vec<String>),
}

/// Splits a line the way a shell would, so quoted documents stay one argument.
pub(crate) fn parse_line(input: &str) -> Result<Line, &'static str> {
    let args = shlex::split(input).ok_or("Invalid quoting")?;
    let Some(first) = args.first() else {
        return Ok(Line::Empty);
    };
    if first.eq_ignore_ascii_case("quit") || first.eq_ignore_ascii_case("exit") {
        return Ok(Line::Quit);
    }
    if first.eq_ignore_ascii_case("help") && args.len() == 1 {
        return Ok(Line::Help);
    }
    Ok(Line::Command(args))
}

/// One line per registered command: its usage, then what it does.
fn write_help<W: Write>(host: &Host, out: &mut W) -> std::io::Result<()> {
    for spec in host.commands() {
        writeln!(out, "{} - {}", spec.usage_text(), spec.description_text())?;
    }
    Ok(())
}

/// Executes lines from `input` until QUIT, EXIT or end of input.
pub(crate) fn run<R: BufRead, W: Write>(
    host: &mut Host,
    input: R,
    mut out: W,
    prompt: bool,
) -> anyhow::Result<()> {
    let mut lines = input.lines();
    loop {
        if prompt {
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };

        match parse_line(&line?) {
            Ok(Line::Empty) => {}
            Ok(Line::Quit) => break,
            Ok(Line::Help) => write_help(host, &mut out)?,
            Ok(Line::Command(argv)) => {
                tracing::debug!("Executing {:?}", argv);
                writeln!(out, "{}", host.execute(&argv))?;
            }
            Err(msg) => writeln!(out, "(error) ERR {msg}")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvfts_search::{SearchConfig, create_module};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run_script(host: &mut Host, script: &str) -> String {
        let mut out = Vec::new();
        run(host, Cursor::new(script), &mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn quoted_arguments_stay_together() {
        assert_eq!(
            parse_line(r#"FT.INDEX books b1 "hello world""#),
            Ok(Line::Command(vec![
                "FT.INDEX".to_string(),
                "books".to_string(),
                "b1".to_string(),
                "hello world".to_string(),
            ]))
        );
    }

    #[test]
    fn blank_quit_and_bad_quoting() {
        assert_eq!(parse_line("   "), Ok(Line::Empty));
        assert_eq!(parse_line("quit"), Ok(Line::Quit));
        assert_eq!(parse_line("EXIT"), Ok(Line::Quit));
        assert_eq!(parse_line("help"), Ok(Line::Help));
        assert!(parse_line("SET k \"open").is_err());
    }

    #[test]
    fn replies_are_printed_until_quit() {
        let mut host = Host::new();

        let output = run_script(&mut host, "SET k v\n\nGET k\nQUIT\nGET k\n");

        assert_eq!(output, "OK\nv\n");
    }

    #[test]
    fn help_lists_every_command() {
        let temp = TempDir::new().unwrap();
        let mut config = SearchConfig::default();
        config.index.root = temp.path().to_path_buf();
        let mut host = Host::new();
        let module = create_module(config).unwrap();
        host.load_module(module, &[]).unwrap();

        let output = run_script(&mut host, "HELP\n");
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 12);
        assert!(lines.contains(&"SET key value - Stores a string, replacing any value."));
        assert!(output.contains("\nFT.CREATE index - "));
        assert!(lines.iter().all(|line| !line.starts_with(" - ")));
        host.shutdown();
    }

    #[test]
    fn search_commands_through_the_shell() {
        let temp = TempDir::new().unwrap();
        let mut config = SearchConfig::default();
        config.index.root = temp.path().to_path_buf();
        let mut host = Host::new();
        let module = create_module(config).unwrap();
        host.load_module(module, &[]).unwrap();

        let script = concat!(
            "FT.CREATE books\n",
            "FT.INDEX books b1 \"a brown fox\"\n",
            "FT.QUERY books fox\n",
            "FT.COUNT books\n",
        );
        let output = run_script(&mut host, script);

        assert_eq!(output, "OK\nOK\n1) b1\n(integer) 1\n");
        host.shutdown();
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
