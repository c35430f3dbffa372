//! Relative platform endpoint paths.

/// Actor ids typed as `username/name` use `~` in URL paths.
pub fn actor_path_id(actor_id: &str) -> String {
    actor_id.trim().replace('/', "~")
}

pub fn list_actors() -> String {
    "/v2/acts?my=1".to_string()
}

pub fn actor(actor_id: &str) -> String {
    format!("/v2/acts/{}", actor_path_id(actor_id))
}

pub fn default_build(actor_id: &str) -> String {
    format!("/v2/acts/{}/builds/default", actor_path_id(actor_id))
}

pub fn start_run(actor_id: &str) -> String {
    format!("/v2/acts/{}/runs", actor_path_id(actor_id))
}

pub fn run(actor_id: &str, run_id: &str) -> String {
    format!("/v2/acts/{}/runs/{run_id}", actor_path_id(actor_id))
}

pub fn dataset_items(run_id: &str) -> String {
    format!("/v2/actor-runs/{run_id}/dataset/items?clean=1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_actor_ids_become_tilde() {
        assert_eq!(actor_path_id("apify/web-scraper"), "apify~web-scraper");
        assert_eq!(start_run("apify/web-scraper"), "/v2/acts/apify~web-scraper/runs");
        assert_eq!(run("abc", "r1"), "/v2/acts/abc/runs/r1");
    }
}
