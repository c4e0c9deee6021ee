/// Shows the server name for rooted requests. Any other unrouted path is a
/// 404 through the router's fallback.
pub(crate) async fn home() -> &'static str {
    "matchbox\n"
}
