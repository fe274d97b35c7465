// Reader for plain text dumps of a thread.
//
// Each post starts with a header line `=== author #postId`. Everything up to
// the next header is the text of the post.

use crate::quest::*;

const HEADER: &str = "===";

pub fn read_text_posts(path: &str) -> QuestResult<Vec<Post>> {
    let contents = fs::read_to_string(path).context(OpeningInputSnafu { path })?;
    parse_text_posts(&contents)
}

pub fn parse_text_posts(contents: &str) -> QuestResult<Vec<Post>> {
    let mut res: Vec<Post> = Vec::new();
    let mut current: Option<(String, u64, Vec<&str>)> = None;
    for (idx, line) in contents.lines().enumerate() {
        let lineno = idx + 1;
        if let Some(header) = line.strip_prefix(HEADER) {
            if let Some(prev) = current.take() {
                let number = res.len() as u32 + 1;
                res.push(make_post(prev, number)?);
            }
            let (author, post_id) = parse_header(header, lineno)?;
            current = Some((author, post_id, Vec::new()));
            continue;
        }
        match current.as_mut() {
            Some((_, _, body)) => body.push(line),
            None if line.trim().is_empty() => {}
            None => return TextHeaderSnafu { lineno, line }.fail(),
        }
    }
    if let Some(last) = current.take() {
        let number = res.len() as u32 + 1;
        res.push(make_post(last, number)?);
    }
    Ok(res)
}

fn parse_header(header: &str, lineno: usize) -> QuestResult<(String, u64)> {
    let (author, id) = header
        .rsplit_once('#')
        .context(TextHeaderSnafu { lineno, line: header })?;
    let post_id = id
        .trim()
        .parse::<u64>()
        .ok()
        .context(TextHeaderSnafu { lineno, line: header })?;
    Ok((author.trim().to_string(), post_id))
}

fn make_post((author, post_id, body): (String, u64, Vec<&str>), number: u32) -> QuestResult<Post> {
    debug!("parse_text_posts: post {} by {}: {} lines", post_id, author, body.len());
    Post::new(&author, post_id, number, &body.join("\n")).context(InvalidPostSnafu {})
}
