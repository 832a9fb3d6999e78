use super::*;

#[test]
fn example() {
    const LYRIC: &str = "[00:12.00]Line 1 lyrics
[00:17.20]Line 2 lyrics";

    assert_eq!(
        parse(LYRIC),
        vec![
            LyricLine::new(12_000_000, "Line 1 lyrics"),
            LyricLine::new(17_200_000, "Line 2 lyrics"),
        ]
    );
}

#[test]
fn fraction_normalization() {
    assert_eq!(parse("[00:01.50]x"), vec![LyricLine::new(1_500_000, "x")]);
    assert_eq!(parse("[00:01.500]x"), vec![LyricLine::new(1_500_000, "x")]);
    assert_eq!(parse("[02:03.045]x"), vec![LyricLine::new(123_045_000, "x")]);
}

#[test]
fn unordered_input() {
    const LYRIC: &str = "[00:30.00]third
[00:10.00]first
[00:20.00]second";

    let texts = parse(LYRIC)
        .into_iter()
        .map(|l| l.text)
        .collect::<Vec<_>>();
    assert_eq!(texts, ["first", "second", "third"]);
}

#[test]
fn equal_timestamps_keep_input_order() {
    const LYRIC: &str = "[00:05.00]b
[00:01.00]a
[00:05.00]c";

    assert_eq!(
        parse(LYRIC),
        vec![
            LyricLine::new(1_000_000, "a"),
            LyricLine::new(5_000_000, "b"),
            LyricLine::new(5_000_000, "c"),
        ]
    );
}

#[test]
fn empty_content_is_dropped() {
    assert!(parse("[00:01.00]   ").is_empty());
    assert!(parse("[00:01.00]").is_empty());
}

#[test]
fn content_is_trimmed() {
    assert_eq!(
        parse("[00:01.00]   spaced out \t"),
        vec![LyricLine::new(1_000_000, "spaced out")]
    );
}

#[test]
fn metadata_and_junk_are_skipped() {
    const LYRIC: &str = "[ar: Jefferson Airplane]
[ti: Somebody to Love]
[length: 2:58]

plain text without a tag
[0:01.00]one-digit minutes
[00:01.5]one-digit fraction
[00:01:50]colon fraction
  [00:02.00]leading space
[00:03.00]kept";

    assert_eq!(parse(LYRIC), vec![LyricLine::new(3_000_000, "kept")]);
}

#[test]
fn crlf_line_endings() {
    assert_eq!(
        parse("[00:01.00]a\r\n[00:02.00]b\r\n"),
        vec![LyricLine::new(1_000_000, "a"), LyricLine::new(2_000_000, "b")]
    );
}

#[test]
fn empty_input() {
    assert!(parse("").is_empty());
}

#[test]
fn concatenated_lines_are_split() {
    let joined = "[00:01.00]first line [00:02.00]second line [00:03.00]third";
    let split = split_concatenated(joined).unwrap();
    assert_eq!(
        parse(&split),
        vec![
            LyricLine::new(1_000_000, "first line"),
            LyricLine::new(2_000_000, "second line"),
            LyricLine::new(3_000_000, "third"),
        ]
    );
}

#[test]
fn brackets_in_lyric_text_are_kept() {
    assert_eq!(split_concatenated("[00:01.00]Intro [instrumental]"), None);
    assert_eq!(
        parse("[00:01.00]Intro [instrumental]"),
        vec![LyricLine::new(1_000_000, "Intro [instrumental]")]
    );

    let joined = "[00:01.00]Intro [instrumental] [00:02.50]Verse [x2]";
    let split = split_concatenated(joined).unwrap();
    assert_eq!(
        parse(&split),
        vec![
            LyricLine::new(1_000_000, "Intro [instrumental]"),
            LyricLine::new(2_500_000, "Verse [x2]"),
        ]
    );
}

#[test]
fn multiline_text_is_not_split() {
    assert_eq!(split_concatenated("[00:01.00]a [b]\n[00:02.00]c"), None);
    assert_eq!(split_concatenated("[00:01.00]single"), None);
}
