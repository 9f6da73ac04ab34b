// chrono and url helpers.

pub fn now() -> chrono::NaiveDateTime {
  chrono::Utc::now().naive_utc()
}

pub fn display_timestamp(ts: &chrono::NaiveDateTime) -> String {
  ts.format("%b %-d, %Y %H:%M").to_string()
}

/// Only accept same-site absolute paths as redirect targets.
pub fn is_local_path(url: &str) -> bool {
  url.starts_with('/') && !url.starts_with("//") && !url.contains('\\')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn local_paths() {
    assert!(is_local_path("/"));
    assert!(is_local_path("/post/3/"));
    assert!(!is_local_path("//evil.example/"));
    assert!(!is_local_path("https://evil.example/"));
    assert!(!is_local_path("/\\evil.example"));
    assert!(!is_local_path(""));
  }

  #[test]
  fn timestamp_format() {
    let ts = chrono::NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
      .and_hms_opt(9, 5, 0).unwrap();
    assert_eq!(display_timestamp(&ts), "Mar 7, 2024 09:05");
  }
}
