use keepsake_core::{MediaItem, MediaType};
use serde_json::json;
use strum::IntoEnumIterator;

#[test]
fn test_media_item_from_gallery_json() {
    let value = json!({
        "id": "abc123",
        "media_type": "video",
        "media_url": "https://cdn.example.com/abc123.mp4",
        "thumbnail_url": "https://cdn.example.com/abc123.jpg",
        "uploader_name": "Dana"
    });

    let item: MediaItem = serde_json::from_value(value).unwrap();
    assert_eq!(item.id(), "abc123");
    assert_eq!(*item.media_type(), MediaType::Video);
    assert!(item.is_video());
    assert_eq!(item.uploader_name().as_deref(), Some("Dana"));
    assert!(item.title().is_none());
}

#[test]
fn test_media_item_skips_missing_optionals_when_serialized() {
    let item = MediaItem::builder()
        .id("p1")
        .media_type(MediaType::Photo)
        .media_url("https://cdn.example.com/p1.jpg")
        .build()
        .unwrap();

    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["media_type"], "photo");
    assert!(value.get("title").is_none());
    assert!(value.get("thumbnail_url").is_none());
}

#[test]
fn test_builder_requires_url() {
    let result = MediaItem::builder().id("p1").media_type(MediaType::Photo).build();
    assert!(result.is_err());
}

#[test]
fn test_media_type_parse_and_display() {
    for media_type in MediaType::iter() {
        let parsed: MediaType = media_type.to_string().parse().unwrap();
        assert_eq!(parsed, media_type);
        assert_eq!(media_type.as_str(), media_type.to_string());
    }
    assert!("audio".parse::<MediaType>().is_err());
}

#[test]
fn test_suggested_filename() {
    let titled = MediaItem::builder()
        .id("1")
        .media_type(MediaType::Photo)
        .media_url("https://cdn.example.com/1.jpg")
        .title("Under the chuppah")
        .build()
        .unwrap();
    assert_eq!(titled.suggested_filename(), "Under the chuppah.jpg");

    let with_extension = MediaItem::builder()
        .id("2")
        .media_type(MediaType::Video)
        .media_url("https://cdn.example.com/2.mov")
        .title("toast.mov")
        .build()
        .unwrap();
    assert_eq!(with_extension.suggested_filename(), "toast.mov");

    let blank_title = MediaItem::builder()
        .id("3")
        .media_type(MediaType::Photo)
        .media_url("https://cdn.example.com/3.jpg")
        .title("   ")
        .build()
        .unwrap();
    assert_eq!(blank_title.suggested_filename(), "keepsake-3.jpg");
}
