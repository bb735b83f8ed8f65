//! Span location and segment emission.

use std::cmp::Reverse;

use crate::llm::Correction;

/// A byte range of the displayed text credited to one correction.
///
/// Offsets always fall on `char` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub start: usize,
    pub end: usize,
    pub correction: &'a Correction,
}

impl Span<'_> {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.end && self.start < end
    }
}

/// A piece of the displayed text: either unhighlighted, or tied to the
/// correction that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Annotated {
        text: &'a str,
        correction: &'a Correction,
    },
}

impl<'a> Segment<'a> {
    /// The text this segment displays.
    pub fn text(&self) -> &'a str {
        match *self {
            Segment::Plain(text) | Segment::Annotated { text, .. } => text,
        }
    }

    pub fn correction(&self) -> Option<&'a Correction> {
        match *self {
            Segment::Plain(_) => None,
            Segment::Annotated { correction, .. } => Some(correction),
        }
    }
}

/// Concatenate the displayed text of `segments`.
pub fn plain_text(segments: &[Segment<'_>]) -> String {
    segments.iter().map(Segment::text).collect()
}

/// Find non-overlapping occurrences of each correction's `corrected` text.
///
/// Corrections are tried longest-first by character count (stable for equal
/// lengths) so a short correction cannot fragment a longer one containing
/// it.  Within a correction, occurrences are scanned left to right and any
/// occurrence that overlaps an already accepted span, partially or by
/// containment, is skipped.  The result is sorted by `start`.
pub fn locate_spans<'a>(text: &str, corrections: &'a [Correction]) -> Vec<Span<'a>> {
    let mut ordered: Vec<&Correction> = corrections
        .iter()
        .filter(|c| !c.corrected.is_empty())
        .collect();
    ordered.sort_by_key(|c| Reverse(c.corrected.chars().count()));

    let mut spans: Vec<Span<'a>> = Vec::new();

    for correction in ordered {
        let needle = correction.corrected.as_str();
        let mut from = 0;

        while let Some(found) = text[from..].find(needle) {
            let start = from + found;
            let end = start + needle.len();

            if !spans.iter().any(|s| s.overlaps(start, end)) {
                spans.push(Span {
                    start,
                    end,
                    correction,
                });
            }

            // Step one character so overlapping occurrences are considered too.
            let step = text[start..].chars().next().map_or(1, char::len_utf8);
            from = start + step;
            if from >= text.len() {
                break;
            }
        }
    }

    spans.sort_by_key(|s| s.start);
    spans
}

/// Split `text` into plain and annotated segments.
///
/// With no corrections, or an empty text, the whole text comes back as a
/// single plain segment.  Otherwise the segments concatenate back to `text`
/// exactly.
///
/// ```
/// use transcript_purifier::annotate::{annotate, Segment};
/// use transcript_purifier::llm::Correction;
///
/// let fix = Correction::new("AI眼究", "AI研究", "homophone");
/// let corrections = [fix.clone()];
/// let segments = annotate("AI研究是重点", &corrections);
/// assert_eq!(
///     segments,
///     vec![
///         Segment::Annotated { text: "AI研究", correction: &fix },
///         Segment::Plain("是重点"),
///     ]
/// );
/// ```
pub fn annotate<'a>(text: &'a str, corrections: &'a [Correction]) -> Vec<Segment<'a>> {
    if text.is_empty() || corrections.is_empty() {
        return vec![Segment::Plain(text)];
    }

    let spans = locate_spans(text, corrections);
    if spans.is_empty() {
        return vec![Segment::Plain(text)];
    }

    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;

    for span in spans {
        if span.start > cursor {
            segments.push(Segment::Plain(&text[cursor..span.start]));
        }
        segments.push(Segment::Annotated {
            text: &text[span.start..span.end],
            correction: span.correction,
        });
        cursor = span.end;
    }

    if cursor < text.len() {
        segments.push(Segment::Plain(&text[cursor..]));
    }

    segments
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(corrected: &str) -> Correction {
        Correction::new(format!("~{corrected}"), corrected, "test")
    }

    fn annotated_texts<'a>(segments: &[Segment<'a>]) -> Vec<&'a str> {
        segments
            .iter()
            .filter(|s| s.correction().is_some())
            .map(Segment::text)
            .collect()
    }

    fn assert_disjoint(spans: &[Span<'_>]) {
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap: {pair:?}");
        }
    }

    #[test]
    fn no_corrections_returns_text_unchanged() {
        for text in ["", "plain text", "多字节文本"] {
            assert_eq!(annotate(text, &[]), vec![Segment::Plain(text)]);
        }
    }

    #[test]
    fn empty_text_returns_single_plain_segment() {
        let corrections = [fix("word")];
        assert_eq!(annotate("", &corrections), vec![Segment::Plain("")]);
    }

    #[test]
    fn unmatched_corrections_leave_text_plain() {
        let corrections = [fix("absent")];
        assert_eq!(
            annotate("the user rewrote this", &corrections),
            vec![Segment::Plain("the user rewrote this")]
        );
    }

    #[test]
    fn emits_prefix_span_and_suffix() {
        let corrections = [fix("budget")];
        let segments = annotate("the budget passed", &corrections);
        assert_eq!(
            segments,
            vec![
                Segment::Plain("the "),
                Segment::Annotated {
                    text: "budget",
                    correction: &corrections[0]
                },
                Segment::Plain(" passed"),
            ]
        );
    }

    #[test]
    fn reconstruction_is_lossless() {
        let text = "今天，我们讨论AI研究的进展。李华提出了新的方法，王芳补充了实验数据。";
        let corrections = [fix("AI研究"), fix("李华"), fix("王芳"), fix("实验数据")];

        let segments = annotate(text, &corrections);
        assert_eq!(plain_text(&segments), text);
        assert_eq!(annotated_texts(&segments), ["AI研究", "李华", "王芳", "实验数据"]);
    }

    #[test]
    fn longer_correction_wins_over_contained_shorter_one() {
        let text = "AI研究是未来";
        // Shorter listed first: ordering must not depend on input order.
        let corrections = [fix("AI"), fix("AI研究")];

        let segments = annotate(text, &corrections);
        assert_eq!(
            segments[0],
            Segment::Annotated {
                text: "AI研究",
                correction: &corrections[1]
            }
        );
        assert_eq!(annotated_texts(&segments), ["AI研究"]);
        assert_eq!(plain_text(&segments), text);
    }

    #[test]
    fn shorter_correction_still_matches_outside_longer_span() {
        let text = "AI研究 and AI tools";
        let corrections = [fix("AI"), fix("AI研究")];

        let spans = locate_spans(text, &corrections);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].correction.corrected, "AI研究");
        assert_eq!(&text[spans[1].start..spans[1].end], "AI");
        assert_eq!(spans[1].correction.corrected, "AI");
    }

    #[test]
    fn partial_overlaps_are_rejected() {
        // "abcd" claims 0..4; "cdef" at 2..6 overlaps and must be skipped.
        let text = "abcdef";
        let corrections = [fix("abcd"), fix("cdef")];

        let spans = locate_spans(text, &corrections);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (0, 4));
    }

    #[test]
    fn self_overlapping_occurrences_are_rejected() {
        let corrections = [fix("aa")];
        let spans = locate_spans("aaa", &corrections);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (0, 2));
    }

    #[test]
    fn repeated_occurrences_are_all_annotated() {
        let corrections = [fix("的")];
        let segments = annotate("我的书的封面", &corrections);
        assert_eq!(annotated_texts(&segments), ["的", "的"]);
        assert_eq!(plain_text(&segments), "我的书的封面");
    }

    #[test]
    fn duplicate_corrections_do_not_double_annotate() {
        let corrections = [fix("word"), fix("word"), fix("word")];
        let spans = locate_spans("a word here", &corrections);
        assert_eq!(spans.len(), 1);
        assert!(std::ptr::eq(spans[0].correction, &corrections[0]));
    }

    #[test]
    fn empty_corrected_strings_are_skipped() {
        let corrections = [fix(""), fix("ok")];
        let spans = locate_spans("ok", &corrections);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].correction.corrected, "ok");
    }

    #[test]
    fn adversarial_lists_never_overlap() {
        let text = "ababab 研究研究研究 xyzzy";
        let corrections = [
            fix("ab"),
            fix("bab"),
            fix("abab"),
            fix("究研"),
            fix("研究研"),
            fix("研究"),
            fix("zz"),
            fix("yzz"),
            fix("xyzzy"),
            fix("b a"),
        ];

        let spans = locate_spans(text, &corrections);
        assert_disjoint(&spans);
        for span in &spans {
            assert_eq!(&text[span.start..span.end], span.correction.corrected);
        }

        let segments = annotate(text, &corrections);
        assert_eq!(plain_text(&segments), text);
    }

    #[test]
    fn equal_length_ties_keep_input_order() {
        // Both are 2 bytes and overlap at 1..2 in "abc"; the first listed wins.
        let corrections = [fix("bc"), fix("ab")];
        let spans = locate_spans("abc", &corrections);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].correction.corrected, "bc");
    }

    #[test]
    fn spans_are_sorted_by_start() {
        let corrections = [fix("zeta"), fix("alpha beta")];
        let spans = locate_spans("zeta then alpha beta then zeta", &corrections);
        let starts: Vec<usize> = spans.iter().map(|s| s.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
        assert_eq!(spans.len(), 3);
    }
}
