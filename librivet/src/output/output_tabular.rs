use crate::align::PairwiseAlignment;

use anyhow::Context;

#[derive(Debug, Clone, Copy)]
pub enum Field {
    Target,
    Query,
    QueryStart,
    QueryEnd,
    TargetStart,
    TargetEnd,
    GapOpens,
    Score,
    Bits,
    Evalue,
}

impl Field {
    pub fn extract_from(&self, hit: &PairwiseAlignment) -> String {
        match self {
            Field::Target => hit.target_name.clone(),
            Field::Query => hit.query_name.clone(),
            Field::QueryStart => hit.query_start.to_string(),
            Field::QueryEnd => hit.query_end.to_string(),
            Field::TargetStart => hit.target_start.to_string(),
            Field::TargetEnd => hit.target_end.to_string(),
            Field::GapOpens => hit.gap_opens.to_string(),
            Field::Score => hit.score.to_string(),
            Field::Bits => format!("{:.1}", hit.bits),
            Field::Evalue => format!("{:.1e}", hit.e_value),
        }
    }
}

pub const DEFAULT_FIELDS: [Field; 10] = [
    Field::Target,
    Field::Query,
    Field::QueryStart,
    Field::QueryEnd,
    Field::TargetStart,
    Field::TargetEnd,
    Field::GapOpens,
    Field::Score,
    Field::Bits,
    Field::Evalue,
];

#[derive(Clone)]
pub struct TableFormat {
    pub fields: Vec<Field>,
    pub labels: Vec<Vec<String>>,
    pub min_widths: Vec<usize>,
    pub widths: Vec<usize>,
}

impl TableFormat {
    pub fn new(fields: &[Field]) -> anyhow::Result<Self> {
        let mut labels = vec![];
        let mut min_widths = vec![];
        let mut widths = vec![];

        // this regex matches CamelCaseWords
        let label_regex =
            regex::Regex::new(r"[A-Z][a-z]*").context("failed to build field label regex")?;

        // this closure extracts the words & minimum column width for a field
        let label_fn = |field: &Field| -> anyhow::Result<(Vec<_>, usize), anyhow::Error> {
            // the Debug string for an enum produces the variant name
            let field_name = format!("{:?}", field);

            // grab each word and its length in the variant name
            let (label_words, lengths): (Vec<_>, Vec<_>) = label_regex
                .find_iter(&field_name)
                .map(|m| (m.as_str().to_string().to_lowercase(), m.len()))
                .unzip();

            // the length of the longest word
            // is the min width of the column
            let min_width = *lengths
                .iter()
                .max()
                .context("failed to produce max field label width")?;
            Ok((label_words, min_width))
        };

        // we need to process the first field differently
        // because it needs to have at least +2 to
        // its minimum width to accomodate the "# " prefix
        let (mut label_words, mut min_width) = label_fn(&fields[0])?;
        labels.push(label_words);
        widths.push(min_width + 2);
        min_widths.push(min_width);

        for field in fields.iter().skip(1) {
            (label_words, min_width) = label_fn(field)?;
            labels.push(label_words);
            widths.push(min_width);
            min_widths.push(min_width);
        }

        Ok(Self {
            fields: fields.to_vec(),
            labels,
            min_widths,
            widths,
        })
    }

    pub fn update_widths(&mut self, hit: &PairwiseAlignment) {
        let widths = &mut self.widths;
        self.fields.iter().enumerate().for_each(|(idx, field)| {
            widths[idx] = widths[idx].max(field.extract_from(hit).len());
        });
    }

    pub fn reset_widths(&mut self) {
        self.widths
            .iter_mut()
            .zip(self.min_widths.iter())
            .for_each(|(width, min_width)| *width = *min_width);
    }

    pub fn row_string(&self, hit: &PairwiseAlignment) -> String {
        let mut row = String::new();

        self.fields
            .iter()
            .zip(self.widths.iter())
            .for_each(|(field, width)| {
                let val = field.extract_from(hit);
                row = format!("{row}{val:width$} ", width = width)
            });

        // remove the last space
        row.pop();

        row
    }

    pub fn header(&self) -> anyhow::Result<String> {
        // the number of rows in the header is
        // the max number of words in a field
        let num_rows = self
            // each entry in labels is
            // a vector of label words
            .labels
            .iter()
            .map(|l| l.len())
            .max()
            .context("field headers are empty")?;

        let mut header_row_strings: Vec<String> = vec!["# ".to_string(); num_rows + 1];

        // this function appends the field labels to the header
        let header_append_fn =
            |words: &Vec<String>, width: usize, header_row_strings: &mut Vec<String>| {
                let offset = num_rows - words.len();
                let mut words_padded = vec![""; offset];
                words.iter().for_each(|w| words_padded.push(w));

                words_padded.iter().enumerate().for_each(|(row, token)| {
                    let row_string = &mut header_row_strings[row];
                    *row_string = format!("{row_string}{:width$} ", token, width = width);
                });
                let last_row_string = &mut header_row_strings[num_rows];
                *last_row_string = format!("{last_row_string}{} ", "-".repeat(width));
            };

        // the first column gets -2 to it's width to account for the "# "
        header_append_fn(&self.labels[0], self.widths[0] - 2, &mut header_row_strings);

        self.labels
            .iter()
            // skip the first column
            .skip(1)
            .zip(self.widths.iter().skip(1))
            .for_each(|(words, &width)| {
                header_append_fn(words, width, &mut header_row_strings);
            });

        Ok(header_row_strings.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::AlignOp;

    fn sample_hit() -> PairwiseAlignment {
        PairwiseAlignment {
            query_name: "query_1".to_string(),
            target_name: "target_1".to_string(),
            query_start: 1,
            query_end: 120,
            target_start: 7,
            target_end: 126,
            ops: vec![AlignOp::Match(120)],
            score: 312,
            bits: 124.8,
            e_value: 3.2e-31,
            gap_opens: 0,
        }
    }

    #[test]
    fn test_header_and_row_align() -> anyhow::Result<()> {
        let mut format = TableFormat::new(&DEFAULT_FIELDS)?;
        let hit = sample_hit();
        format.update_widths(&hit);

        let header = format.header()?;
        let row = format.row_string(&hit);

        // the dashed rule spans the data row plus its trailing space
        let last_line_len = header.lines().last().map(|l| l.len());
        assert_eq!(last_line_len, Some(row.len() + 1));
        assert!(row.contains("target_1"));
        assert!(row.contains("3.2e-31"));
        Ok(())
    }

    #[test]
    fn test_widths_grow_and_reset() -> anyhow::Result<()> {
        let mut format = TableFormat::new(&DEFAULT_FIELDS)?;
        let min_widths = format.widths.clone();

        let mut hit = sample_hit();
        hit.target_name = "a_target_with_a_very_long_name".to_string();
        format.update_widths(&hit);
        assert!(format.widths[0] > min_widths[0]);

        format.reset_widths();
        assert_eq!(format.widths[0], format.min_widths[0]);
        Ok(())
    }
}
