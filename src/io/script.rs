use crate::io::{Format, error::Error};
use crate::model::stage::{Command, StageDocument, StageName};
use std::io::{BufRead, Write};
use std::sync::OnceLock;

const DEFAULT_TEMPLATE: &str = include_str!("../../resources/md.template");

static TEMPLATE: OnceLock<StageDocument> = OnceLock::new();

/// The built-in molecular-dynamics template, parsed once.
pub fn default_template() -> &'static StageDocument {
    TEMPLATE.get_or_init(|| {
        read_str(DEFAULT_TEMPLATE)
            .expect("Failed to parse embedded MD template. This is a library bug.")
    })
}

/// Reads a stage-ordered script.
///
/// A comment line whose text is a stage name (`# Ensemble`) opens that
/// stage; any other comment is dropped, as is text after an unquoted `#`.
/// A trailing `&` joins a line with the next. Commands before the first
/// header go to the stage the command table assigns them.
pub fn read<R: BufRead>(reader: R) -> Result<StageDocument, Error> {
    let mut doc = StageDocument::new();
    let mut current: Option<StageName> = None;
    let mut pending = String::new();
    let mut pending_line = 0;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;

        if pending.is_empty() {
            if let Some(comment) = line.trim().strip_prefix('#') {
                if let Ok(stage) = comment.trim().parse::<StageName>() {
                    doc.append_stage(stage);
                    current = Some(stage);
                }
                continue;
            }
        }

        let content = strip_comment(&line).trim();
        let (content, continues) = match content.strip_suffix('&') {
            Some(head) => (head.trim_end(), true),
            None => (content, false),
        };
        if pending.is_empty() {
            if content.is_empty() && !continues {
                continue;
            }
            pending_line = line_no;
        } else if !content.is_empty() {
            pending.push(' ');
        }
        pending.push_str(content);

        if !continues {
            push_command(&mut doc, current, &pending, pending_line)?;
            pending.clear();
        }
    }

    if !pending.trim().is_empty() {
        push_command(&mut doc, current, &pending, pending_line)?;
    }
    Ok(doc)
}

pub fn read_str(text: &str) -> Result<StageDocument, Error> {
    read(text.as_bytes())
}

/// Writes a document as `# <Stage>` blocks separated by blank lines.
pub fn write<W: Write>(mut writer: W, doc: &StageDocument) -> Result<(), Error> {
    write!(writer, "{}", doc)?;
    writer.flush()?;
    Ok(())
}

fn push_command(
    doc: &mut StageDocument,
    current: Option<StageName>,
    text: &str,
    line: usize,
) -> Result<(), Error> {
    let command = Command::parse(text);
    if command.name.is_empty() {
        return Ok(());
    }
    let stage = match current.or_else(|| StageName::for_command(&command.name)) {
        Some(stage) => stage,
        None => {
            return Err(Error::parse(
                Format::Script,
                line,
                format!(
                    "command '{}' appears before any stage header and has no default stage",
                    command.name
                ),
            ));
        }
    };
    if current.is_some() {
        doc.append_stage(stage).commands.push(command);
    } else {
        doc.push(stage, command);
    }
    Ok(())
}

/// Cuts a line at the first `#` outside single or double quotes.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '#') => return &line[..i],
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_commands_and_order() {
        let doc = read_str(
            "# Initialization\nunits metal\natom_style atomic\n\n# Actions\nrun 100\n",
        )
        .unwrap();
        assert_eq!(
            doc.stage_names(),
            vec![StageName::Initialization, StageName::Actions]
        );
        assert_eq!(doc.args_of("units"), vec!["metal"]);
        assert_eq!(doc.args_of("run"), vec!["100"]);
    }

    #[test]
    fn file_order_is_kept_even_when_not_canonical() {
        let doc = read_str("# Actions\nrun 5\n# Initialization\nunits real\n").unwrap();
        assert_eq!(
            doc.stage_names(),
            vec![StageName::Actions, StageName::Initialization]
        );
    }

    #[test]
    fn comments_and_continuations() {
        let doc = read_str(
            "# Ensemble\n# a plain comment\nfix 1 all nvt temp 300 300 &\n    0.1   # damping\nprint \"# not a comment\"\n",
        )
        .unwrap();
        let ensemble = doc.stage(StageName::Ensemble).unwrap();
        assert_eq!(ensemble.args_of("fix"), vec!["1 all nvt temp 300 300 0.1"]);
        assert_eq!(ensemble.args_of("print"), vec!["\"# not a comment\""]);
        assert_eq!(ensemble.commands.len(), 2);
    }

    #[test]
    fn headerless_commands_use_the_command_table() {
        let doc = read_str("units metal\nrun 10\n").unwrap();
        assert_eq!(
            doc.stage_names(),
            vec![StageName::Initialization, StageName::Actions]
        );
    }

    #[test]
    fn headerless_unknown_command_is_an_error() {
        let err = read_str("\nprint hello\n").unwrap_err();
        match err {
            Error::Parse { format, line, details } => {
                assert_eq!(format, Format::Script);
                assert_eq!(line, 2);
                assert!(details.contains("print"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn write_then_read_preserves_document() {
        let doc = default_template().clone();
        let mut buf = Vec::new();
        write(&mut buf, &doc).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("# Initialization\nunits metal\n"));
        assert_eq!(read_str(&text).unwrap(), doc);
    }

    #[test]
    fn default_template_has_every_stage() {
        assert_eq!(default_template().stage_names(), StageName::ALL.to_vec());
        assert_eq!(default_template().args_of("fix"), vec!["1 all nvt temp 300 300 0.1"]);
    }
}
