//! Relative links between generated pages and their resources.
//!
//! Locations are `/`-separated paths relative to the working directory, the
//! same base as document input and output paths.

use crate::RenderError;

/// Compute the link from `page` to `resource`.
///
/// Both arguments are file locations: non-empty and not ending with `/`.
///
/// # Examples
///
/// ```
/// use md2html_render::relativize_resource;
///
/// assert_eq!(relativize_resource("site/css/main.css", "site/guide/intro.html").unwrap(), "../css/main.css");
/// assert_eq!(relativize_resource("site/b.html", "site/a.html").unwrap(), "b.html");
/// ```
pub fn relativize_resource(resource: &str, page: &str) -> Result<String, RenderError> {
    let page = check_page(page)?;
    let resource = resource.replace('\\', "/");
    if resource.is_empty() || resource.ends_with('/') {
        return Err(RenderError::Location(format!(
            "'{resource}' is not a resource location"
        )));
    }

    let result = relative_segments(&resource, &page)?.join("/");
    if result.is_empty() {
        Ok(".".to_owned())
    } else {
        Ok(result)
    }
}

/// Compute the path prefix leading from `page` to the directory `path`.
///
/// `path` must be empty or end with `/`, and so does the result, so it can
/// be prepended to file names (`{{ resources }}logo.png`).
///
/// # Examples
///
/// ```
/// use md2html_render::relativize_resource_path;
///
/// assert_eq!(relativize_resource_path("assets/", "docs/guide.html").unwrap(), "../assets/");
/// assert_eq!(relativize_resource_path("docs/", "docs/guide.html").unwrap(), "");
/// ```
pub fn relativize_resource_path(path: &str, page: &str) -> Result<String, RenderError> {
    let page = check_page(page)?;
    let path = path.replace('\\', "/");
    if (!path.is_empty() && !path.ends_with('/')) || path == "/" {
        return Err(RenderError::Location(format!(
            "'{path}' is not a relative resource path"
        )));
    }

    let segments = relative_segments(&path, &page)?;
    if segments.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{}/", segments.join("/")))
    }
}

fn check_page(page: &str) -> Result<String, RenderError> {
    let page = page.replace('\\', "/");
    if page.is_empty() || page.ends_with('/') {
        return Err(RenderError::Location(format!(
            "'{page}' is not a page location"
        )));
    }
    Ok(page)
}

/// Segments of the relative path from the directory of `page` to `target`.
fn relative_segments(target: &str, page: &str) -> Result<Vec<String>, RenderError> {
    let mut page_dir = normalize(page);
    page_dir.pop();
    let mut target_segs = normalize(target);

    // Leading `..` in the page directory, or a mix of absolute and relative
    // locations, can only be resolved against the working directory.
    if page.starts_with('/') != target.starts_with('/') || page_dir.iter().any(|s| s == "..") {
        let cwd = std::env::current_dir()
            .map_err(|e| RenderError::Location(format!("cannot resolve '{page}': {e}")))?;
        let cwd = cwd.to_string_lossy().replace('\\', "/");
        page_dir = normalize(&absolute(&cwd, page));
        page_dir.pop();
        target_segs = normalize(&absolute(&cwd, target));
    }

    let common = page_dir
        .iter()
        .zip(&target_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments = vec!["..".to_owned(); page_dir.len() - common];
    segments.extend(target_segs.into_iter().skip(common));
    Ok(segments)
}

fn absolute(cwd: &str, location: &str) -> String {
    if location.starts_with('/') {
        location.to_owned()
    } else {
        format!("{cwd}/{location}")
    }
}

/// Lexically normalize a location into its segments.
fn normalize(location: &str) -> Vec<String> {
    let rooted = location.starts_with('/');
    let mut segments: Vec<String> = Vec::new();
    for segment in location.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..".to_owned());
                }
            }
            other => segments.push(other.to_owned()),
        }
    }
    segments
}
