//! Movie model and its TMDB wire format.

use serde::Deserialize;

/// Base URL for TMDB poster images at 500px width
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// A movie, as the app works with it
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    /// TMDB identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Plot summary
    pub overview: String,
    /// Poster path relative to the image CDN
    pub poster_path: Option<String>,
    /// Release date, `YYYY-MM-DD`
    pub release_date: String,
    /// Average vote, 0 to 10
    pub vote_average: f64,
}

impl Movie {
    /// Full poster URL, if the movie has a poster
    #[must_use]
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|path| format!("{POSTER_BASE_URL}{path}"))
    }

    /// Rating on a 0 to 5 scale
    #[must_use]
    pub fn normalized_rating(&self) -> f64 {
        self.vote_average / 2.0
    }
}

/// Body of a TMDB `/search/movie` response
#[derive(Debug, Clone, Deserialize)]
pub struct MovieSearchResponseDto {
    /// Matching movies
    pub results: Vec<MovieDto>,
}

/// One TMDB search result
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDto {
    /// TMDB identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Plot summary
    #[serde(default)]
    pub overview: String,
    /// Poster path, absent for some entries
    pub poster_path: Option<String>,
    /// Release date
    #[serde(default)]
    pub release_date: String,
    /// Average vote
    #[serde(default)]
    pub vote_average: f64,
}

impl From<MovieDto> for Movie {
    fn from(dto: MovieDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            overview: dto.overview,
            poster_path: dto.poster_path,
            release_date: dto.release_date,
            vote_average: dto.vote_average,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(poster_path: Option<&str>, vote_average: f64) -> Movie {
        Movie {
            id: 1,
            title: "Inception".to_string(),
            overview: String::new(),
            poster_path: poster_path.map(str::to_string),
            release_date: "2010-07-15".to_string(),
            vote_average,
        }
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(
            movie(Some("/abc.jpg"), 8.0).poster_url().as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(movie(None, 8.0).poster_url(), None);
    }

    #[test]
    fn test_normalized_rating_halves_vote() {
        assert!((movie(None, 8.4).normalized_rating() - 4.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_tolerates_missing_fields() {
        let json = r#"{"results":[{"id":7,"title":"Untitled","poster_path":null}]}"#;
        let response: MovieSearchResponseDto = serde_json::from_str(json).unwrap();
        let movie = Movie::from(response.results[0].clone());

        assert_eq!(movie.id, 7);
        assert_eq!(movie.poster_url(), None);
        assert!(movie.release_date.is_empty());
    }
}
