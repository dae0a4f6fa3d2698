use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_ARTIST_LENGTH: usize = 100;

/// Hosts accepted for `song_link`. A link matches when its hostname contains one
/// of these, so subdomains such as `www.` or `open.` pass.
pub const ALLOWED_LINK_DOMAINS: [&str; 4] =
    ["youtube.com", "youtu.be", "spotify.com", "soundcloud.com"];

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitSongModel {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub song_link: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("title is required")]
    MissingTitle,
    #[error("artist is required")]
    MissingArtist,
    #[error("title must be at most 100 characters")]
    TitleTooLong,
    #[error("artist must be at most 100 characters")]
    ArtistTooLong,
    #[error("song link must point to YouTube, Spotify or SoundCloud")]
    InvalidSongLink,
}

/// A validated attendee submission with trimmed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongSubmission {
    pub title: String,
    pub artist: String,
    pub song_link: Option<String>,
}

impl SongSubmission {
    pub fn parse(
        title: &str,
        artist: &str,
        song_link: Option<&str>,
    ) -> Result<Self, SubmissionError> {
        let title = title.trim();
        let artist = artist.trim();

        if title.is_empty() {
            return Err(SubmissionError::MissingTitle);
        }
        if artist.is_empty() {
            return Err(SubmissionError::MissingArtist);
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(SubmissionError::TitleTooLong);
        }
        if artist.chars().count() > MAX_ARTIST_LENGTH {
            return Err(SubmissionError::ArtistTooLong);
        }

        let song_link = match song_link.map(str::trim) {
            None | Some("") => None,
            Some(link) if is_allowed_song_link(link) => Some(link.to_string()),
            Some(_) => return Err(SubmissionError::InvalidSongLink),
        };

        Ok(Self {
            title: title.to_string(),
            artist: artist.to_string(),
            song_link,
        })
    }
}

impl TryFrom<SubmitSongModel> for SongSubmission {
    type Error = SubmissionError;

    fn try_from(model: SubmitSongModel) -> Result<Self, Self::Error> {
        Self::parse(&model.title, &model.artist, model.song_link.as_deref())
    }
}

pub fn is_allowed_song_link(link: &str) -> bool {
    let Ok(url) = Url::parse(link) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match url.host_str() {
        Some(host) => ALLOWED_LINK_DOMAINS.iter().any(|domain| host.contains(domain)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_links_from_allowed_hosts() {
        for link in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC",
            "https://soundcloud.com/artist/track",
            "http://m.youtube.com/watch?v=abc",
        ] {
            assert!(is_allowed_song_link(link), "{link} should be accepted");
        }
    }

    #[test]
    fn rejects_other_hosts_and_malformed_links() {
        for link in [
            "https://example.com/song.mp3",
            "youtube.com/watch?v=abc",
            "not a url",
            "ftp://youtube.com/file",
            "https://vimeo.com/123",
        ] {
            assert!(!is_allowed_song_link(link), "{link} should be rejected");
        }
    }

    #[test]
    fn trims_fields_and_drops_empty_link() {
        let submission = SongSubmission::parse("  Song  ", " Artist ", Some("   ")).unwrap();
        assert_eq!(submission.title, "Song");
        assert_eq!(submission.artist, "Artist");
        assert_eq!(submission.song_link, None);
    }

    #[test]
    fn rejects_blank_and_overlong_fields() {
        assert_eq!(
            SongSubmission::parse("   ", "Artist", None),
            Err(SubmissionError::MissingTitle)
        );
        assert_eq!(
            SongSubmission::parse("Song", "", None),
            Err(SubmissionError::MissingArtist)
        );
        assert_eq!(
            SongSubmission::parse(&"a".repeat(101), "Artist", None),
            Err(SubmissionError::TitleTooLong)
        );
        assert!(SongSubmission::parse(&"a".repeat(100), "Artist", None).is_ok());
        assert_eq!(
            SongSubmission::parse("Song", &"b".repeat(101), None),
            Err(SubmissionError::ArtistTooLong)
        );
    }

    #[test]
    fn rejects_disallowed_link() {
        assert_eq!(
            SongSubmission::parse("Song", "Artist", Some("https://example.com")),
            Err(SubmissionError::InvalidSongLink)
        );
    }
}
