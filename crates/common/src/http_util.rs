use crate::auction::UrlBuilder;

/// Append `segments` to the path of `base`.
///
/// Segments are percent-encoded by [`url::Url`]; `;` and `=` pass through so
/// protocol parameters inside a segment stay readable. A trailing slash on the
/// base does not produce an empty segment. An unparseable base falls back to
/// joining with `/`.
#[must_use]
pub fn append_path_segments(base: &str, segments: &[String]) -> String {
    let Ok(mut url) = url::Url::parse(base) else {
        log::warn!("append_path_segments: failed to parse base URL, joining as-is");
        return join_segments(base, segments);
    };

    match url.path_segments_mut() {
        Ok(mut path) => {
            path.pop_if_empty().extend(segments);
        }
        Err(()) => {
            log::warn!("append_path_segments: base URL cannot carry a path, joining as-is");
            return join_segments(base, segments);
        }
    }

    url.to_string()
}

fn join_segments(base: &str, segments: &[String]) -> String {
    let mut joined = base.trim_end_matches('/').to_string();
    for segment in segments {
        joined.push('/');
        joined.push_str(segment);
    }
    joined
}

/// [`UrlBuilder`] backed by [`append_path_segments`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PathUrlBuilder;

impl UrlBuilder for PathUrlBuilder {
    fn build_url(&self, base: &str, segments: &[String]) -> String {
        append_path_segments(base, segments)
    }
}
