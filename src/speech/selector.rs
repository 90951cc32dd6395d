use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, Lines};

/// Parse a microphone index typed by the user
pub fn parse_selection(answer: &str, device_count: usize) -> Option<usize> {
    answer
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&index| index < device_count)
}

/// List microphones and ask for one until a valid index is entered
pub async fn select_microphone<R>(names: &[String], lines: &mut Lines<R>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    if names.is_empty() {
        anyhow::bail!("No microphones found");
    }

    println!("Available microphone devices:");
    for (index, name) in names.iter().enumerate() {
        println!("[{}] {}", index, name);
    }

    loop {
        print!("Select microphone index: ");
        std::io::stdout().flush()?;

        let Some(answer) = lines.next_line().await? else {
            anyhow::bail!("No microphone selected");
        };

        match parse_selection(&answer, names.len()) {
            Some(index) => return Ok(index),
            None => println!(
                "Please enter a number between 0 and {}.",
                names.len() - 1
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    fn names() -> Vec<String> {
        vec!["Built-in".to_string(), "Blue Snowball".to_string()]
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1", 2), Some(1));
        assert_eq!(parse_selection(" 0 \n", 2), Some(0));
        assert_eq!(parse_selection("2", 2), None);
        assert_eq!(parse_selection("-1", 2), None);
        assert_eq!(parse_selection("mic", 2), None);
    }

    #[tokio::test]
    async fn test_reprompts_until_valid() {
        let mut lines = BufReader::new(&b"snowball\n7\n1\n"[..]).lines();
        assert_eq!(select_microphone(&names(), &mut lines).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_end_of_input_is_an_error() {
        let mut lines = BufReader::new(&b"abc\n"[..]).lines();
        assert!(select_microphone(&names(), &mut lines).await.is_err());
    }

    #[tokio::test]
    async fn test_no_devices() {
        let mut lines = BufReader::new(&b"0\n"[..]).lines();
        assert!(select_microphone(&[], &mut lines).await.is_err());
    }
}
