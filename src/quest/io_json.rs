// Reader for posts exported as a JSON array.

use crate::quest::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct JsonPost {
    author: String,
    #[serde(rename = "postId")]
    post_id: u64,
    /// Position in the thread. Defaults to the position in the file.
    number: Option<u32>,
    text: String,
}

pub fn read_json_posts(path: &str) -> QuestResult<Vec<Post>> {
    let contents = fs::read_to_string(path).context(OpeningInputSnafu { path })?;
    parse_json_posts(&contents)
}

pub fn parse_json_posts(contents: &str) -> QuestResult<Vec<Post>> {
    let raw: Vec<JsonPost> = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    let mut res: Vec<Post> = Vec::new();
    for (idx, jp) in raw.iter().enumerate() {
        let number = jp.number.unwrap_or(idx as u32 + 1);
        debug!("parse_json_posts: post {} by {}", jp.post_id, jp.author);
        let post = Post::new(&jp.author, jp.post_id, number, &jp.text).context(InvalidPostSnafu {})?;
        res.push(post);
    }
    Ok(res)
}
