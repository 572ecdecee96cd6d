use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
#[cfg(not(feature = "with-serde"))]
use anyhow::bail;
use mailverdict::{Label, Suggestion, Verdict, VerificationResult, write_delimited};

use crate::args::{Cli, Format};

pub fn write_results(results: &[VerificationResult], cli: &Cli) -> Result<()> {
    let bytes = match cli.format {
        Format::Human => render_human(results),
        Format::Csv => render_delimited(results, b',')?,
        Format::Tsv => render_delimited(results, b'\t')?,
        Format::Json => render_json(results)?,
    };
    emit(&bytes, cli)
}

pub fn write_check(
    address: &str,
    verdict: &Verdict,
    suggestions: &[Suggestion],
    cli: &Cli,
) -> Result<()> {
    match cli.format {
        Format::Human => {
            let mut bytes = render_human(&[VerificationResult::new(address, verdict.label)]);
            if !suggestions.is_empty() {
                let names: Vec<&str> = suggestions.iter().map(|s| s.domain.as_str()).collect();
                bytes.extend_from_slice(format!("        did you mean: {}?\n", names.join(", ")).as_bytes());
            }
            emit(&bytes, cli)
        }
        Format::Json => emit(&render_check_json(address, verdict, suggestions)?, cli),
        Format::Csv | Format::Tsv => {
            write_results(&[VerificationResult::new(address, verdict.label)], cli)
        }
    }
}

pub fn all_valid(results: &[VerificationResult]) -> bool {
    results.iter().all(|r| r.label.is_valid())
}

fn render_human(results: &[VerificationResult]) -> Vec<u8> {
    let mut out = String::new();
    for result in results {
        let tag = match result.label {
            Label::Valid => "[VALID]  ",
            Label::Risky => "[RISKY]  ",
            Label::Unknown => "[UNKNOWN]",
            Label::Invalid => "[INVALID]",
        };
        out.push_str(&format!("{tag} {}\n", result.address));
    }
    out.into_bytes()
}

fn render_delimited(results: &[VerificationResult], delimiter: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_delimited(results, &mut buf, delimiter).context("render delimited report")?;
    Ok(buf)
}

#[cfg(feature = "with-serde")]
fn render_json(results: &[VerificationResult]) -> Result<Vec<u8>> {
    let mut s = serde_json::to_string_pretty(results)?;
    s.push('\n');
    Ok(s.into_bytes())
}

#[cfg(not(feature = "with-serde"))]
fn render_json(_: &[VerificationResult]) -> Result<Vec<u8>> {
    bail!("--format json requires the 'with-serde' feature")
}

#[cfg(feature = "with-serde")]
fn render_check_json(address: &str, verdict: &Verdict, suggestions: &[Suggestion]) -> Result<Vec<u8>> {
    #[derive(serde::Serialize)]
    struct CheckPayload<'a> {
        email: &'a str,
        label: mailverdict::Label,
        decided_by: mailverdict::Stage,
        suggestions: &'a [Suggestion],
    }

    let payload = CheckPayload {
        email: address,
        label: verdict.label,
        decided_by: verdict.decided_by,
        suggestions,
    };
    let mut s = serde_json::to_string_pretty(&payload)?;
    s.push('\n');
    Ok(s.into_bytes())
}

#[cfg(not(feature = "with-serde"))]
fn render_check_json(_: &str, _: &Verdict, _: &[Suggestion]) -> Result<Vec<u8>> {
    bail!("--format json requires the 'with-serde' feature")
}

fn emit(bytes: &[u8], cli: &Cli) -> Result<()> {
    match &cli.out {
        Some(path) => write_all_atomically(path, bytes),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn write_all_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    {
        let mut f = std::fs::File::create(&tmp)
            .with_context(|| format!("create {}", Path::new(&tmp).display()))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| {
        format!("rename {} -> {}", Path::new(&tmp).display(), path.display())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_lines_are_aligned() {
        let rendered = render_human(&[
            VerificationResult::new("a@valid.com", Label::Valid),
            VerificationResult::new("bad", Label::Invalid),
        ]);
        assert_eq!(
            String::from_utf8(rendered).expect("utf8"),
            "[VALID]   a@valid.com\n[INVALID] bad\n"
        );
    }

    #[test]
    fn all_valid_requires_every_label() {
        let mut results = vec![VerificationResult::new("a@valid.com", Label::Valid)];
        assert!(all_valid(&results));
        results.push(VerificationResult::new("b@valid.com", Label::Unknown));
        assert!(!all_valid(&results));
    }

    #[test]
    fn atomic_write_replaces_file() {
        let path = std::env::temp_dir().join(format!("mailverdict-out-{}.csv", std::process::id()));
        write_all_atomically(&path, b"first").expect("write");
        write_all_atomically(&path, b"second").expect("rewrite");
        let contents = std::fs::read_to_string(&path).expect("read");
        std::fs::remove_file(&path).ok();
        assert_eq!(contents, "second");
    }
}
