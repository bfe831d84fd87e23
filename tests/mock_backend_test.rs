#[cfg(feature = "mock")]
mod mock_tests {
    use mockall::predicate::*;
    use release_scrobbler::{
        ArtistMapping, MockScrobbleBackend, PollSettings, Release, ReleaseTrack, ReleaseView,
        Result, ScrobbleBackend, SubmitRequest,
    };

    fn release() -> Release {
        Release::new(
            "1",
            "Boris (2)",
            "Pink",
            vec![
                ReleaseTrack::new("A1", "Farewell").with_duration("7:06"),
                ReleaseTrack::new("A2", "Pink").with_duration("4:19"),
            ],
        )
    }

    #[tokio::test]
    async fn test_mock_as_trait_object() -> Result<()> {
        let mut backend = MockScrobbleBackend::new();
        backend
            .expect_lookup_artist_mapping()
            .with(eq("Boris (2)"))
            .times(1)
            .returning(|_| Ok(ArtistMapping::mapped_to("Boris")));

        let backend: &dyn ScrobbleBackend = &backend;
        let mapping = backend.lookup_artist_mapping("Boris (2)").await?;
        assert!(mapping.has_mapping);
        assert_eq!(mapping.lastfm_name, "Boris");
        Ok(())
    }

    #[tokio::test]
    async fn test_view_pauses_on_unmapped_artist() -> Result<()> {
        let mut backend = MockScrobbleBackend::new();
        backend
            .expect_fetch_release()
            .with(eq("1"))
            .returning(|_| Ok(release()));
        backend
            .expect_fetch_album_history()
            .with(eq("Boris"), eq("Pink"))
            .returning(|_, _| Ok(Default::default()));
        backend
            .expect_lookup_artist_mapping()
            .times(1)
            .returning(|_| Ok(ArtistMapping::unmapped()));
        backend.expect_submit_scrobble_batch().never();

        let mut view = ReleaseView::load(&backend, "1", PollSettings::default()).await?;
        assert_eq!(
            view.submit(&backend).await?,
            SubmitRequest::AwaitingConfirmation(vec!["Boris (2)".to_string()])
        );
        Ok(())
    }
}
