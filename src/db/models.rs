use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub created_at: String,
}

/// Public view of a user, safe to return from the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRead {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Image,
    Video,
}

impl FileType {
    /// Classify by the declared content type only; the bytes are never inspected.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with("video/") => FileType::Video,
            _ => FileType::Image,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "Image",
            FileType::Video => "Video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Image" => Some(FileType::Image),
            "Video" => Some(FileType::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: Option<String>,
    pub caption: String,
    pub url: String,
    pub file_type: FileType,
    pub file_name: String,
    pub created_at: String,
}

/// Fields supplied by the upload flow; id and created_at are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: String,
    pub caption: String,
    pub url: String,
    pub file_type: FileType,
    pub file_name: String,
}

/// A post joined with its author's email, as stored.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub author: String,
    pub caption: String,
    pub url: String,
    pub file_type: FileType,
    pub file_name: String,
    pub created_at: String,
    pub is_owner: bool,
}

impl FeedEntry {
    pub fn for_viewer(row: PostWithAuthor, viewer_id: &str) -> Self {
        let PostWithAuthor { post, author_email } = row;
        let is_owner = post.user_id.as_deref() == Some(viewer_id);
        Self {
            id: post.id,
            user_id: post.user_id,
            author: author_email.unwrap_or_else(|| "Unknown".to_string()),
            caption: post.caption,
            url: post.url,
            file_type: post.file_type,
            file_name: post.file_name,
            created_at: post.created_at,
            is_owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(user_id: Option<&str>, author: Option<&str>) -> PostWithAuthor {
        PostWithAuthor {
            post: Post {
                id: "p1".into(),
                user_id: user_id.map(String::from),
                caption: "hi".into(),
                url: "http://media/cat.png".into(),
                file_type: FileType::Image,
                file_name: "cat.png".into(),
                created_at: "2026-01-01T00:00:00.000Z".into(),
            },
            author_email: author.map(String::from),
        }
    }

    #[test]
    fn video_content_types_are_video() {
        assert_eq!(FileType::from_content_type(Some("video/mp4")), FileType::Video);
        assert_eq!(
            FileType::from_content_type(Some("video/quicktime")),
            FileType::Video
        );
    }

    #[test]
    fn everything_else_is_image() {
        assert_eq!(FileType::from_content_type(Some("image/png")), FileType::Image);
        assert_eq!(
            FileType::from_content_type(Some("application/pdf")),
            FileType::Image
        );
        assert_eq!(FileType::from_content_type(Some("VIDEO/mp4")), FileType::Image);
        assert_eq!(FileType::from_content_type(None), FileType::Image);
    }

    #[test]
    fn file_type_round_trips_through_str() {
        assert_eq!(FileType::parse(FileType::Video.as_str()), Some(FileType::Video));
        assert_eq!(FileType::parse("gif"), None);
    }

    #[test]
    fn file_type_serializes_as_name() {
        assert_eq!(serde_json::to_string(&FileType::Video).unwrap(), "\"Video\"");
    }

    #[test]
    fn feed_entry_marks_owner() {
        let entry = FeedEntry::for_viewer(sample(Some("u1"), Some("u1@example.com")), "u1");
        assert!(entry.is_owner);
        assert_eq!(entry.author, "u1@example.com");
    }

    #[test]
    fn feed_entry_other_viewer_is_not_owner() {
        let entry = FeedEntry::for_viewer(sample(Some("u1"), Some("u1@example.com")), "u2");
        assert!(!entry.is_owner);
    }

    #[test]
    fn orphaned_post_has_unknown_author() {
        let entry = FeedEntry::for_viewer(sample(None, None), "u1");
        assert!(!entry.is_owner);
        assert_eq!(entry.author, "Unknown");
        assert!(entry.user_id.is_none());
    }

    #[test]
    fn user_read_hides_password_hash() {
        let user = User {
            id: "u1".into(),
            email: "a@b.c".into(),
            password_hash: "secret".into(),
            is_active: true,
            is_superuser: false,
            is_verified: false,
            created_at: "now".into(),
        };
        let json = serde_json::to_value(UserRead::from(user.clone())).unwrap();
        assert!(json.get("password_hash").is_none());
        let json = serde_json::to_value(user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
