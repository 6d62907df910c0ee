use std::fmt;

use chrono::format::{Fixed, Item, Numeric, Pad};
use chrono::{DateTime, FixedOffset, Timelike};

use rollfile_base::{RollfileResult, bail};

use crate::location::Location;

/* 📖 # Why reference-date layouts instead of strftime patterns?

Path templates are written by example: the reference instant
`Mon Jan 2 15:04:05 MST 2006` is spelled the way the resulting path should look,
so `logs/2006-01-02.txt` reads as "one file per day". Each field of the reference
instant has a distinct value, which makes the tokens unambiguous.

The layout is compiled once into chrono formatting items, so resolving a path on
every write is a plain format call with no re-parsing. Two tokens are rendered
by hand instead:
- `MST` becomes the zone name of the writer's location (`UTC`, or `-0800`)
  because chrono would print `+00:00`, and a colon is not valid in every file name
- fractional seconds take any width from 1 to 9 digits. A run of `0`s keeps
  trailing zeros, while a run of `9`s drops them, together with the separator
  when nothing is left

`Jan` and `Mon` followed by a lowercase letter are plain text, so a template
like `Monthly/2006.log` keeps its directory name.
*/

/// Tokens recognized in a layout, longest first where one is a prefix of another.
const TOKENS: &[(&str, Item<'static>)] = &[
    ("January", Item::Fixed(Fixed::LongMonthName)),
    ("Jan", Item::Fixed(Fixed::ShortMonthName)),
    ("Monday", Item::Fixed(Fixed::LongWeekdayName)),
    ("Mon", Item::Fixed(Fixed::ShortWeekdayName)),
    ("2006", Item::Numeric(Numeric::Year, Pad::Zero)),
    ("Z07:00", Item::Fixed(Fixed::TimezoneOffsetColonZ)),
    ("Z0700", Item::Fixed(Fixed::TimezoneOffsetZ)),
    ("-07:00", Item::Fixed(Fixed::TimezoneOffsetColon)),
    ("-0700", Item::Fixed(Fixed::TimezoneOffset)),
    ("002", Item::Numeric(Numeric::Ordinal, Pad::Zero)),
    ("__2", Item::Numeric(Numeric::Ordinal, Pad::Space)),
    ("_2", Item::Numeric(Numeric::Day, Pad::Space)),
    ("01", Item::Numeric(Numeric::Month, Pad::Zero)),
    ("02", Item::Numeric(Numeric::Day, Pad::Zero)),
    ("03", Item::Numeric(Numeric::Hour12, Pad::Zero)),
    ("04", Item::Numeric(Numeric::Minute, Pad::Zero)),
    ("05", Item::Numeric(Numeric::Second, Pad::Zero)),
    ("06", Item::Numeric(Numeric::YearMod100, Pad::Zero)),
    ("15", Item::Numeric(Numeric::Hour, Pad::Zero)),
    ("PM", Item::Fixed(Fixed::UpperAmPm)),
    ("pm", Item::Fixed(Fixed::LowerAmPm)),
    ("1", Item::Numeric(Numeric::Month, Pad::None)),
    ("2", Item::Numeric(Numeric::Day, Pad::None)),
    ("3", Item::Numeric(Numeric::Hour12, Pad::None)),
    ("4", Item::Numeric(Numeric::Minute, Pad::None)),
    ("5", Item::Numeric(Numeric::Second, Pad::None)),
];

/// Short names that are not tokens when a lowercase letter follows.
const WORD_PREFIXES: &[&str] = &["Jan", "Mon"];

#[derive(Debug, Clone)]
enum Piece {
    Items(Vec<Item<'static>>),
    ZoneName,
    Fraction {
        separator: char,
        digits: usize,
        trim: bool,
    },
}

/// A compiled path template such as `logs/2006-01-02.txt`.
#[derive(Debug, Clone)]
pub struct PathLayout {
    layout: String,
    pieces: Vec<Piece>,
}

impl PathLayout {
    /// Compile a layout. Text that is not a recognized token is kept literally.
    pub fn parse(layout: &str) -> RollfileResult<Self> {
        if layout.is_empty() {
            bail!("path template must not be empty");
        }

        let mut builder = PieceBuilder::default();
        let mut rest = layout;
        while let Some(ch) = rest.chars().next() {
            if let Some(len) = match_token(rest, &mut builder) {
                rest = &rest[len..];
            } else {
                builder.literal.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }

        Ok(Self {
            layout: layout.to_string(),
            pieces: builder.finish(),
        })
    }

    /// Render the layout for an instant already converted into `location`.
    pub fn format(&self, instant: &DateTime<FixedOffset>, location: &Location) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Items(items) => {
                    out.push_str(&instant.format_with_items(items.iter()).to_string())
                }
                Piece::ZoneName => out.push_str(&location.zone_name(instant)),
                Piece::Fraction {
                    separator,
                    digits,
                    trim,
                } => push_fraction(&mut out, instant, *separator, *digits, *trim),
            }
        }
        out
    }

    /// The layout as written.
    pub fn as_str(&self) -> &str {
        &self.layout
    }
}

impl fmt::Display for PathLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.layout)
    }
}

#[derive(Default)]
struct PieceBuilder {
    pieces: Vec<Piece>,
    items: Vec<Item<'static>>,
    literal: String,
}

impl PieceBuilder {
    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            let literal = std::mem::take(&mut self.literal);
            self.items.push(Item::OwnedLiteral(literal.into()));
        }
    }

    fn push_item(&mut self, item: Item<'static>) {
        self.flush_literal();
        self.items.push(item);
    }

    fn push_piece(&mut self, piece: Piece) {
        self.flush_literal();
        if !self.items.is_empty() {
            self.pieces.push(Piece::Items(std::mem::take(&mut self.items)));
        }
        self.pieces.push(piece);
    }

    fn finish(mut self) -> Vec<Piece> {
        self.flush_literal();
        if !self.items.is_empty() {
            self.pieces.push(Piece::Items(self.items));
        }
        self.pieces
    }
}

/// Consumes the token at the start of `rest`, returning its length.
fn match_token(rest: &str, builder: &mut PieceBuilder) -> Option<usize> {
    // `_2006` is an underscore followed by the year, not a padded day.
    if rest.starts_with("_2006") {
        builder.push_item(Item::Literal("_"));
        builder.push_item(Item::Numeric(Numeric::Year, Pad::Zero));
        return Some(5);
    }
    if rest.starts_with("MST") {
        builder.push_piece(Piece::ZoneName);
        return Some(3);
    }
    if let Some((len, fraction)) = match_fraction(rest) {
        builder.push_piece(fraction);
        return Some(len);
    }
    let (token, item) = TOKENS
        .iter()
        .find(|(token, _)| rest.starts_with(token) && !continues_word(token, &rest[token.len()..]))?;
    builder.push_item(item.clone());
    Some(token.len())
}

fn continues_word(token: &str, after: &str) -> bool {
    WORD_PREFIXES.contains(&token) && after.starts_with(|c: char| c.is_ascii_lowercase())
}

fn match_fraction(rest: &str) -> Option<(usize, Piece)> {
    let mut chars = rest.chars();
    let separator = chars.next().filter(|c| *c == '.' || *c == ',')?;
    let digit = chars.next().filter(|c| *c == '0' || *c == '9')?;
    let digits = rest[1..].bytes().take_while(|b| *b == digit as u8).count();
    if digits > 9 || rest[1 + digits..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((
        1 + digits,
        Piece::Fraction {
            separator,
            digits,
            trim: digit == '9',
        },
    ))
}

fn push_fraction(
    out: &mut String,
    instant: &DateTime<FixedOffset>,
    separator: char,
    digits: usize,
    trim: bool,
) {
    let nanos = format!("{:09}", instant.nanosecond() % 1_000_000_000);
    let mut fraction = &nanos[..digits];
    if trim {
        fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            return;
        }
    }
    out.push(separator);
    out.push_str(fraction);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use expect_test::expect;

    fn sample_instant() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2024, 3, 10, 3, 4, 5)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(123))
            .unwrap()
            .fixed_offset()
    }

    fn format_utc(layout: &str, instant: &DateTime<FixedOffset>) -> String {
        PathLayout::parse(layout)
            .unwrap()
            .format(instant, &Location::Utc)
    }

    fn render(layouts: &[&str], instant: &DateTime<FixedOffset>, location: &Location) -> String {
        layouts
            .iter()
            .map(|layout| {
                let compiled = PathLayout::parse(layout).unwrap();
                format!("{} => {}\n", layout, compiled.format(instant, location))
            })
            .collect()
    }

    #[test]
    fn test_format_reference_tokens() {
        let rendered = render(
            &[
                "2006-01-02 15:04:05",
                "Jan _2 Mon 3PM",
                "January Monday",
                "06/1/2",
                "002",
                "15h04m05.000s",
                "pct%/2006.log",
                "logs/second/2006-01-02.txt",
                "archive_2006",
                "2006-01-02-MST.log",
            ],
            &sample_instant(),
            &Location::Utc,
        );

        expect![[r#"
            2006-01-02 15:04:05 => 2024-03-10 03:04:05
            Jan _2 Mon 3PM => Mar 10 Sun 3AM
            January Monday => March Sunday
            06/1/2 => 24/3/10
            002 => 070
            15h04m05.000s => 03h04m05.123s
            pct%/2006.log => pct%/2024.log
            logs/second/2006-01-02.txt => logs/second/2024-03-10.txt
            archive_2006 => archive_2024
            2006-01-02-MST.log => 2024-03-10-UTC.log
        "#]]
        .assert_eq(&rendered);
    }

    #[test]
    fn test_format_offsets() {
        let pacific = Location::fixed(-8 * 3600).unwrap();
        let instant = sample_instant().with_timezone(&FixedOffset::west_opt(8 * 3600).unwrap());

        let rendered = render(
            &["2006-01-02T15:04-07:00", "-0700", "Z07:00", "2006-01-02-MST.log"],
            &instant,
            &pacific,
        );
        expect![[r#"
            2006-01-02T15:04-07:00 => 2024-03-09T19:04-08:00
            -0700 => -0800
            Z07:00 => -08:00
            2006-01-02-MST.log => 2024-03-09--0800.log
        "#]]
        .assert_eq(&rendered);

        assert_eq!(format_utc("Z07:00", &sample_instant()), "Z");
    }

    #[test]
    fn test_month_and_weekday_words_stay_literal() {
        let instant = sample_instant();
        assert_eq!(format_utc("Monthly/2006.log", &instant), "Monthly/2024.log");
        assert_eq!(format_utc("Janet-2006.log", &instant), "Janet-2024.log");
        assert_eq!(format_utc("Money/Mon.log", &instant), "Money/Sun.log");
        assert_eq!(format_utc("Jan-Mon_", &instant), "Mar-Sun_");
        assert_eq!(format_utc("JanX", &instant), "MarX");
    }

    #[test]
    fn test_fraction_widths() {
        let instant = sample_instant();
        let rendered = render(
            &[
                "05.0", "05.00", "05.000000", "05.000000000", "05.9", "05.999999", "05,000",
            ],
            &instant,
            &Location::Utc,
        );
        expect![[r#"
            05.0 => 05.1
            05.00 => 05.12
            05.000000 => 05.123000
            05.000000000 => 05.123000000
            05.9 => 05.1
            05.999999 => 05.123
            05,000 => 05,123
        "#]]
        .assert_eq(&rendered);

        let whole_second = Utc.with_ymd_and_hms(2024, 3, 10, 3, 4, 5).unwrap().fixed_offset();
        assert_eq!(format_utc("05.999.log", &whole_second), "05.log");
        assert_eq!(format_utc("05.000.log", &whole_second), "05.000.log");
    }

    #[test]
    fn test_fraction_followed_by_digit_is_literal() {
        // ".0001" is not a fraction; the trailing 1 is still the month.
        assert_eq!(format_utc(".0001", &sample_instant()), ".0003");
    }

    #[test]
    fn test_plain_text_is_literal() {
        let layout = PathLayout::parse("app.log").unwrap();
        assert_eq!(layout.format(&sample_instant(), &Location::Utc), "app.log");
        assert_eq!(layout.as_str(), "app.log");
        assert_eq!(layout.to_string(), "app.log");
    }

    #[test]
    fn test_empty_layout_is_rejected() {
        let error = PathLayout::parse("").unwrap_err();
        assert_eq!(error.to_string(), "path template must not be empty");
    }
}
