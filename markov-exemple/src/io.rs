use std::fs::File;
use std::io::{self, Read};
use std::num::TryFromIntError;
use std::path::Path;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
    let mut contents = String::new();
    File::open(filename)?.read_to_string(&mut contents)?;
    Ok(contents.lines().map(str::to_owned).collect())
}

/// Splits lines into lowercase word sequences, dropping blank lines.
pub fn word_sequences(lines: &[String]) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|line| line.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>())
        .filter(|words| !words.is_empty())
        .collect()
}

/// Returns the byte length of every word, in reading order.
pub fn word_lengths(lines: &[String]) -> Result<Vec<u32>, TryFromIntError> {
    lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .map(|word| u32::try_from(word.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_file_splits_lines() {
        let path = std::env::temp_dir().join(format!("markov-exemple-{}.txt", std::process::id()));
        std::fs::write(&path, "one two\r\nthree\n").unwrap();
        let lines = read_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(lines, vec!["one two".to_owned(), "three".to_owned()]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_file("./does/not/exist.txt").is_err());
    }

    #[test]
    fn word_sequences_skip_blank_lines() {
        let lines = vec!["The Cat".to_owned(), "   ".to_owned(), "sat".to_owned()];
        assert_eq!(
            word_sequences(&lines),
            vec![vec!["the".to_owned(), "cat".to_owned()], vec!["sat".to_owned()]]
        );
    }

    #[test]
    fn word_lengths_keep_long_words() {
        let long = "a".repeat(70_000);
        let lines = vec![format!("to be {long}"), "é".to_owned()];
        assert_eq!(word_lengths(&lines).unwrap(), vec![2, 2, 70_000, 2]);
    }
}
