//! Integration tests for device enumeration: index/unique-ID
//! resolution and hot-plug behavior.

use std::sync::Arc;

use framegrab::grabber::{DeviceEnumerator, GrabError};
use framegrab::synthetic::{SyntheticDevice, SyntheticHost};

fn two_camera_host() -> Arc<SyntheticHost> {
    Arc::new(
        SyntheticHost::new()
            .with_device(
                SyntheticDevice::new("CamA")
                    .with_model_id("A-1000")
                    .with_manufacturer("Acme"),
            )
            .with_device(
                SyntheticDevice::new("CamB")
                    .with_model_id("B-2000")
                    .with_manufacturer("Bolt"),
            ),
    )
}

#[test]
fn test_count_reflects_connected_devices() {
    let enumerator = DeviceEnumerator::new(two_camera_host());
    assert_eq!(enumerator.count().unwrap(), 2);
}

#[test]
fn test_describe_returns_metadata() {
    let enumerator = DeviceEnumerator::new(two_camera_host());
    let device = enumerator.describe(1).unwrap();
    assert_eq!(device.unique_id, "CamB-uid");
    assert_eq!(device.model_id, "B-2000");
    assert_eq!(device.manufacturer, "Bolt");
    assert_eq!(device.localized_name, "CamB");
    assert_eq!(device.index, 1);
}

#[test]
fn test_unique_ids_round_trip_through_indices() {
    let enumerator = DeviceEnumerator::new(two_camera_host());
    let count = enumerator.count().unwrap();
    for index in 0..count {
        let unique_id = enumerator.unique_id_for(index).unwrap();
        assert_eq!(enumerator.index_for(&unique_id), Some(index));
        assert_eq!(enumerator.describe(index).unwrap().unique_id, unique_id);
    }
}

#[test]
fn test_index_for_known_and_missing_ids() {
    let enumerator = DeviceEnumerator::new(two_camera_host());
    assert_eq!(enumerator.index_for("CamB-uid"), Some(1));
    assert_eq!(enumerator.index_for("missing"), None);
}

#[test]
fn test_describe_past_end_is_out_of_range() {
    let enumerator = DeviceEnumerator::new(two_camera_host());
    match enumerator.describe(2) {
        Err(GrabError::OutOfRange { index, count }) => {
            assert_eq!(index, 2);
            assert_eq!(count, 2);
        }
        other => panic!("expected OutOfRange, got {:?}", other),
    }
}

#[test]
fn test_hot_plug_renumbers_indices_but_keeps_unique_ids() {
    let host = two_camera_host();
    let enumerator = DeviceEnumerator::new(host.clone());

    assert_eq!(enumerator.index_for("CamB-uid"), Some(1));

    // Unplugging the first device shifts CamB down a slot; its unique
    // ID still resolves.
    assert!(host.remove_device("CamA-uid"));
    assert_eq!(enumerator.count().unwrap(), 1);
    assert_eq!(enumerator.index_for("CamB-uid"), Some(0));
    assert_eq!(enumerator.index_for("CamA-uid"), None);
    assert_eq!(enumerator.describe(0).unwrap().unique_id, "CamB-uid");

    // Plugging it back appends at the end
    host.add_device(SyntheticDevice::new("CamA"));
    assert_eq!(enumerator.index_for("CamA-uid"), Some(1));
}

#[test]
fn test_enumeration_is_never_cached() {
    let host = Arc::new(SyntheticHost::new());
    let enumerator = DeviceEnumerator::new(host.clone());
    assert_eq!(enumerator.count().unwrap(), 0);

    host.add_device(SyntheticDevice::new("Late"));
    assert_eq!(enumerator.count().unwrap(), 1);
    assert_eq!(enumerator.describe(0).unwrap().localized_name, "Late");
}
