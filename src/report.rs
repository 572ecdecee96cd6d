//! Delimited export of batch results.

use std::io::Write;

use crate::pipeline::VerificationResult;

pub const HEADER: [&str; 2] = ["email", "label"];

/// Writes a header row then one `email,label` row per result, in order.
/// Fields are quoted by the usual CSV rules for the chosen delimiter.
pub fn write_delimited<W: Write>(
    results: &[VerificationResult],
    writer: W,
    delimiter: u8,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    wtr.write_record(HEADER)?;
    for result in results {
        wtr.write_record([result.address.as_str(), result.label.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Label;

    fn render(results: &[VerificationResult], delimiter: u8) -> String {
        let mut buf = Vec::new();
        write_delimited(results, &mut buf, delimiter).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn csv_with_header_and_quoting() {
        let results = [
            VerificationResult::new("a@valid.com", Label::Valid),
            VerificationResult::new("bad", Label::Invalid),
            VerificationResult::new("b@mailinator.com", Label::Risky),
            VerificationResult::new("x,y@example.com", Label::Invalid),
            VerificationResult::new("", Label::Invalid),
        ];
        insta::assert_snapshot!(render(&results, b',').trim_end(), @r#"
        email,label
        a@valid.com,Valid
        bad,Invalid
        b@mailinator.com,Risky
        "x,y@example.com",Invalid
        ,Invalid
        "#);
    }

    #[test]
    fn tab_delimiter_leaves_commas_alone() {
        let results = [VerificationResult::new("x,y@example.com", Label::Unknown)];
        assert_eq!(
            render(&results, b'\t'),
            "email\tlabel\nx,y@example.com\tUnknown\n"
        );
    }

    #[test]
    fn empty_batch_still_has_header() {
        assert_eq!(render(&[], b','), "email,label\n");
    }
}
