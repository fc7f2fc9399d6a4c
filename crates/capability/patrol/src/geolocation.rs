//! 定位：提交时尽力获取坐标，失败一律降级为"无坐标"。

use async_trait::async_trait;
use domain::Coordinates;
use std::time::Duration;

/// 定位错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("geolocation permission denied")]
    PermissionDenied,
    #[error("geolocation unavailable: {0}")]
    Unavailable(String),
}

/// 定位来源。
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Option<Coordinates>, GeolocationError>;
}

/// 不提供定位。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl GeolocationProvider for NoGeolocation {
    async fn current_position(&self) -> Result<Option<Coordinates>, GeolocationError> {
        Ok(None)
    }
}

/// 客户端上报的坐标。
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportedPosition(pub Option<Coordinates>);

#[async_trait]
impl GeolocationProvider for ReportedPosition {
    async fn current_position(&self) -> Result<Option<Coordinates>, GeolocationError> {
        Ok(self.0)
    }
}

/// 在限定时间内获取坐标。
///
/// 错误、拒绝、超时或坐标越界都返回 `None`，不会阻塞提交。
pub async fn locate_with_timeout(
    provider: &dyn GeolocationProvider,
    timeout: Duration,
) -> Option<Coordinates> {
    let reason = match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(Ok(None)) => return None,
        Ok(Ok(Some(coordinates))) if coordinates.is_valid() => return Some(coordinates),
        Ok(Ok(Some(_))) => "out_of_range".to_string(),
        Ok(Err(err)) => err.to_string(),
        Err(_) => "timeout".to_string(),
    };
    fms_telemetry::record_geolocation_unavailable();
    tracing::warn!(target: "fms.patrol", reason = %reason, "geolocation_unavailable");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Denied;

    #[async_trait]
    impl GeolocationProvider for Denied {
        async fn current_position(&self) -> Result<Option<Coordinates>, GeolocationError> {
            Err(GeolocationError::PermissionDenied)
        }
    }

    struct Stalled;

    #[async_trait]
    impl GeolocationProvider for Stalled {
        async fn current_position(&self) -> Result<Option<Coordinates>, GeolocationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some(Coordinates { lat: 0.0, lng: 0.0 }))
        }
    }

    #[tokio::test]
    async fn valid_position_passes_through() {
        let position = Coordinates {
            lat: 31.23,
            lng: 121.47,
        };
        let located =
            locate_with_timeout(&ReportedPosition(Some(position)), Duration::from_secs(1)).await;
        assert_eq!(located, Some(position));
    }

    #[tokio::test]
    async fn failures_degrade_to_none() {
        let timeout = Duration::from_millis(20);
        assert_eq!(locate_with_timeout(&NoGeolocation, timeout).await, None);
        assert_eq!(locate_with_timeout(&Denied, timeout).await, None);
        assert_eq!(locate_with_timeout(&Stalled, timeout).await, None);
        let out_of_range = ReportedPosition(Some(Coordinates {
            lat: 95.0,
            lng: 0.0,
        }));
        assert_eq!(locate_with_timeout(&out_of_range, timeout).await, None);
    }
}
