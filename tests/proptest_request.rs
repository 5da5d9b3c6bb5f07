use proptest::prelude::*;
use proptest::test_runner::Config;

use unibro_client::error::extract_detail;
use unibro_client::models::request::{join_url, ApiRequest};

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn join_url_has_single_separator(
        base in "https?://[a-z]{1,12}(:[0-9]{2,5})?(/api/v1)?/{0,2}",
        path in "/{0,2}[a-z0-9_]{1,10}(/[a-z0-9_]{1,10}){0,3}"
    ) {
        let url = join_url(&base, &path);
        let base_trimmed = base.trim_end_matches('/');
        let path_trimmed = path.trim_start_matches('/');
        prop_assert_eq!(url, format!("{}/{}", base_trimmed, path_trimmed));
    }

    #[test]
    fn only_the_refresh_endpoint_is_exempt(
        lead in "/?",
        path in "[a-z]{1,8}(/[a-z0-9]{1,8}){0,3}",
        trail in "/{0,2}"
    ) {
        prop_assume!(path != "users/refresh" && !path.ends_with("/users/refresh"));
        let plain = format!("{}{}{}", lead, path, trail);
        prop_assert!(!ApiRequest::get(plain).is_refresh_endpoint());

        let nested = format!("{}{}/users/refresh{}", lead, path, trail);
        prop_assert!(ApiRequest::post(nested).is_refresh_endpoint());

        let bare = format!("{}users/refresh{}", lead, trail);
        prop_assert!(ApiRequest::post(bare).is_refresh_endpoint());
    }

    #[test]
    fn detail_string_is_extracted(detail in "[A-Za-z0-9 .,!?]{1,60}") {
        let body = serde_json::json!({ "detail": detail }).to_string();
        prop_assert_eq!(extract_detail(&body), detail);
    }
}
