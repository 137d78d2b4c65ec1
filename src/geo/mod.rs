use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::models::booking::GeoPoint;

/// Bounded geolocation read for embedding clients. A fix that does not
/// arrive within the limit is simply omitted; a transition is never blocked
/// on location.
pub async fn read_with_timeout<F>(source: F, limit: Duration) -> Option<GeoPoint>
where
    F: Future<Output = Option<GeoPoint>>,
{
    timeout(limit, source).await.ok().flatten()
}
