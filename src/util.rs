pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Default local filename for downloaded results, picking the extension
/// from the content type the server declared.
pub(crate) fn results_filename(file_id: &str, content_type: &str) -> String {
    let ct = content_type.to_lowercase();
    let ext = if ct.contains("spreadsheetml.sheet") {
        ".xlsx"
    } else if ct.contains("excel") {
        ".xls"
    } else {
        ".csv"
    };
    format!("validiz_results_{}{}", file_id, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_urls_without_doubling_slashes() {
        assert_eq!(
            join_url("https://api.validiz.com/v1", "validate/email"),
            "https://api.validiz.com/v1/validate/email"
        );
        assert_eq!(
            join_url("https://api.validiz.com/v1/", "/validate/email"),
            "https://api.validiz.com/v1/validate/email"
        );
    }

    #[test]
    fn results_filename_tracks_the_content_type() {
        assert_eq!(
            results_filename("file_12345", "text/csv"),
            "validiz_results_file_12345.csv"
        );
        assert_eq!(
            results_filename(
                "file_12345",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            "validiz_results_file_12345.xlsx"
        );
        assert_eq!(
            results_filename("file_12345", "application/vnd.ms-excel"),
            "validiz_results_file_12345.xls"
        );
        assert_eq!(
            results_filename("file_12345", ""),
            "validiz_results_file_12345.csv"
        );
    }
}
