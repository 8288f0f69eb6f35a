//! Integration tests: full rounds between an initiator and a scripted
//! peer, and observer polling, over in-process links.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use ttt_core::{
    Board, Captured, FrameCodec, HEADER_LENGTH, Initiator, InitiatorConfig, Link, MacAddr,
    MemoryLink, Observation, Observer, ObserverConfig, ObserverState, Outcome, PROTOCOL_VERSION,
    ParseError, RecordingReporter, Reporter, SessionEvent, SessionState, SessionStatus, Token,
    Transport, TttError, TttHeader, TttPacket, DEFAULT_ETHER_TYPE,
};
use ttt_core::packet::Frame;

const HOST: MacAddr = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);

// ── Helpers ──────────────────────────────────────────────────────

fn encode(frame: Frame) -> BytesMut {
    let mut buf = BytesMut::new();
    FrameCodec::default().encode(frame, &mut buf).unwrap();
    buf
}

/// A peer that answers every request with `board` and `status`,
/// echoing the request's round tag.
fn spawn_peer(mut link: MemoryLink, board: Board, status: &'static str) {
    tokio::spawn(async move {
        let codec = FrameCodec::default();
        while let Ok(captured) = link.recv().await {
            let Ok(request) = codec.decode_frame(&captured.data) else {
                continue;
            };
            let header = TttHeader::new(
                request.header().version(),
                request.header().state(),
                board,
                Token::new(status).unwrap(),
            );
            let packet = match request.packet.round() {
                Some(round) => TttPacket::tagged(header, round),
                None => TttPacket::new(header),
            };
            let reply = Frame::new(request.src, link.local_mac(), packet);
            if link.send(&encode(reply)).await.is_err() {
                break;
            }
        }
    });
}

fn moves(list: &[&str]) -> std::vec::IntoIter<String> {
    list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
}

fn fast_observer(link: MemoryLink) -> Observer<MemoryLink> {
    Observer::new(
        link,
        ObserverConfig {
            capture_window: Duration::from_millis(50),
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        },
    )
}

/// Records events and stops the observer after `limit` of them.
struct StopAfter {
    inner: RecordingReporter,
    limit: usize,
    stop: Arc<AtomicBool>,
}

impl Reporter for StopAfter {
    fn event(&mut self, event: SessionEvent) {
        self.inner.event(event);
        if self.inner.events.len() >= self.limit {
            self.stop.store(false, Ordering::SeqCst);
        }
    }

    fn error(&mut self, error: &TttError) {
        self.inner.error(error);
    }
}

// ── Codec ────────────────────────────────────────────────────────

#[test]
fn test_board_survives_encode_decode() {
    let cells = ["X", "-", "-", "-", "O", "-", "-", "-", "-"];
    let bytes = TttHeader::encode(0x01, "pl", &cells, "pg").unwrap();
    assert_eq!(bytes.len(), HEADER_LENGTH);

    let header = TttHeader::from_bytes(&bytes).unwrap();
    let decoded: Vec<String> = header
        .board()
        .cells()
        .iter()
        .map(|&c| char::from(c).to_string())
        .collect();
    assert_eq!(decoded, cells);
    assert_eq!(header.status_token().to_text(), "pg");
}

#[test]
fn test_short_buffers_are_rejected() {
    for len in 0..HEADER_LENGTH {
        let err = TttHeader::from_bytes(&vec![b'-'; len]).unwrap_err();
        assert_eq!(
            err,
            ParseError::TooShort {
                expected: HEADER_LENGTH,
                actual: len
            }
        );
    }
}

// ── Initiator ────────────────────────────────────────────────────

#[tokio::test]
async fn test_player_win_is_reported() {
    let (host, peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let final_board = Board::from_raw(*b"XXXOO----");
    spawn_peer(peer, final_board, "pv");

    let transport = Transport::new(host, MacAddr::PEER, DEFAULT_ETHER_TYPE);
    let mut initiator = Initiator::new(transport, InitiatorConfig::default());
    let mut reporter = RecordingReporter::default();

    let state = tokio::time::timeout(
        Duration::from_secs(5),
        initiator.run(&mut moves(&["t5", "quit"]), &mut reporter, SessionState::new()),
    )
    .await
    .expect("timeout")
    .unwrap();

    assert!(reporter.errors.is_empty(), "{:?}", reporter.errors);
    assert_eq!(
        reporter.events,
        vec![
            SessionEvent::Sent {
                header: TttHeader::for_move(PROTOCOL_VERSION, Token::new("t5").unwrap()),
                round: Some(1),
            },
            SessionEvent::Reply {
                board: final_board,
                status: SessionStatus::PlayerWins,
                round: Some(1),
            },
            SessionEvent::Terminated,
        ]
    );
    assert_eq!(reporter.events[1].outcome(), Some(Outcome::PlayerWins));
    assert_eq!(state.board(), &final_board);
    assert_eq!(state.outcome(), Outcome::PlayerWins);
    assert_eq!(state.replies(), 1);
    assert_eq!(state.board().to_string(), "X X X\n\nO O -\n\n- - -");
}

#[tokio::test]
async fn test_failed_round_does_not_end_session() {
    let (host, peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    spawn_peer(peer, Board::from_raw(*b"X--------"), "pg");

    let transport = Transport::new(host, MacAddr::PEER, DEFAULT_ETHER_TYPE);
    let mut initiator = Initiator::new(transport, InitiatorConfig::default());
    let mut reporter = RecordingReporter::default();

    let state = initiator
        .run(
            &mut moves(&["toolong", "t1", "t2"]),
            &mut reporter,
            SessionState::new(),
        )
        .await
        .unwrap();

    assert_eq!(reporter.errors.len(), 1);
    let replies = reporter
        .events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Reply { .. }))
        .count();
    assert_eq!(replies, 2);
    // End of input terminates like `quit`.
    assert_eq!(reporter.events.last(), Some(&SessionEvent::Terminated));
    assert_eq!(state.round(), 3);
}

#[tokio::test]
async fn test_no_responder_times_out() {
    let (host, _peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let mut transport = Transport::new(host, MacAddr::PEER, DEFAULT_ETHER_TYPE);

    let deadline = Duration::from_millis(100);
    let started = std::time::Instant::now();
    let packet = TttPacket::new(TttHeader::for_move(1, Token::new("t5").unwrap()));
    let err = transport
        .send_and_await_reply(packet, deadline)
        .await
        .unwrap_err();

    assert!(matches!(err, TttError::Timeout(_)));
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_late_reply_is_not_taken_for_next_round() {
    let (host, mut peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let reply = |request: &Frame, cells: &[u8; 9]| {
        let header = TttHeader::new(
            1,
            Token::new("pl").unwrap(),
            Board::from_raw(*cells),
            Token::new("pg").unwrap(),
        );
        let round = request.packet.round().unwrap();
        Frame::new(request.src, MacAddr::PEER, TttPacket::tagged(header, round))
    };
    tokio::spawn(async move {
        let codec = FrameCodec::default();
        // Round 1 is answered only after the initiator gave up on it.
        let first = codec.decode_frame(&peer.recv().await.unwrap().data).unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        peer.send(&encode(reply(&first, b"O--------"))).await.unwrap();

        let second = codec.decode_frame(&peer.recv().await.unwrap().data).unwrap();
        peer.send(&encode(reply(&second, b"X---O----"))).await.unwrap();
    });

    let transport = Transport::new(host, MacAddr::PEER, DEFAULT_ETHER_TYPE);
    let config = InitiatorConfig {
        reply_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let mut initiator = Initiator::new(transport, config);
    let mut reporter = RecordingReporter::default();

    let state = initiator
        .run(&mut moves(&["t1", "t2"]), &mut reporter, SessionState::new())
        .await
        .unwrap();

    assert_eq!(reporter.errors.len(), 1, "{:?}", reporter.errors);
    let replies: Vec<_> = reporter
        .events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Reply { .. }))
        .collect();
    assert_eq!(
        replies,
        vec![&SessionEvent::Reply {
            board: Board::from_raw(*b"X---O----"),
            status: SessionStatus::InProgress,
            round: Some(2),
        }]
    );
    assert_eq!(state.board().cells(), b"X---O----");
    assert_eq!(state.replies(), 1);
}

// ── Observer ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_capture_reports_no_response() {
    let (link, _peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let mut observer = fast_observer(link);

    let (state, result) = observer.poll(ObserverState::new()).await;
    assert_eq!(result.unwrap(), Observation::NoResponse);
    assert_eq!(state.empty_polls(), 1);

    let mut reporter = StopAfter {
        inner: RecordingReporter::default(),
        limit: 2,
        stop: observer.stop_handle(),
    };
    let state = observer.run(&mut reporter, state).await.unwrap();
    assert_eq!(
        reporter.inner.events,
        vec![SessionEvent::NoResponse, SessionEvent::NoResponse]
    );
    assert_eq!(state.polls(), 3);
}

#[tokio::test]
async fn test_runt_frame_reports_header_not_found() {
    let (link, mut peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let mut observer = fast_observer(link);

    peer.send(&[0u8; 8]).await.unwrap();
    let (_, result) = observer.poll(ObserverState::new()).await;
    match result {
        Err(TttError::Parse(ParseError::TooShort { actual, .. })) => assert_eq!(actual, 8),
        other => panic!("expected TooShort, got {other:?}"),
    }

    // In the loop the same input is reported and polling continues.
    peer.send(&[0u8; 8]).await.unwrap();
    let mut reporter = StopAfter {
        inner: RecordingReporter::default(),
        limit: 2,
        stop: observer.stop_handle(),
    };
    observer.run(&mut reporter, ObserverState::new()).await.unwrap();
    assert_eq!(
        reporter.inner.events,
        vec![SessionEvent::HeaderNotFound, SessionEvent::NoResponse]
    );
}

#[tokio::test]
async fn test_observer_renders_newest_round() {
    let (link, mut peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let mut observer = fast_observer(link);

    let frame = |cells: &[u8; 9], status: &str, round: u32| {
        let header = TttHeader::new(
            1,
            Token::new("pl").unwrap(),
            Board::from_raw(*cells),
            Token::new(status).unwrap(),
        );
        Frame::new(MacAddr::PEER, HOST, TttPacket::tagged(header, round))
    };
    peer.send(&encode(frame(b"XOX-O-XO-", "sv", 7))).await.unwrap();
    peer.send(&encode(frame(b"X---O----", "pg", 2))).await.unwrap();

    let (state, result) = observer.poll(ObserverState::new()).await;
    let Observation::Frame(picked) = result.unwrap() else {
        panic!("expected a frame");
    };
    assert_eq!(picked.packet.round(), Some(7));
    assert_eq!(state.outcome(), Outcome::SwitchWins);
    assert_eq!(state.last_round(), Some(7));
    assert_eq!(state.board().cells(), b"XOX-O-XO-");
}

#[tokio::test]
async fn test_observer_ignores_frames_for_other_hosts() {
    let (link, mut peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let mut observer = fast_observer(link);

    let header = TttHeader::default();
    let elsewhere = Frame::new(HOST, MacAddr::PEER, TttPacket::new(header));
    peer.send(&encode(elsewhere)).await.unwrap();

    let (_, result) = observer.poll(ObserverState::new()).await;
    assert_eq!(result.unwrap(), Observation::NoResponse);
}

#[tokio::test]
async fn test_observer_stops_on_closed_link() {
    let (link, peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    drop(peer);
    let mut observer = fast_observer(link);
    let mut reporter = RecordingReporter::default();

    let err = observer
        .run(&mut reporter, ObserverState::new())
        .await
        .unwrap_err();
    assert!(matches!(err, TttError::LinkClosed));
    assert_eq!(reporter.errors.len(), 1);
}

#[tokio::test]
async fn test_injected_capture_reaches_observer() {
    let (link, _peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let link = link.with_echo();
    let header = TttHeader::new(
        1,
        Token::new("pl").unwrap(),
        Board::from_raw(*b"OOOXX----"),
        Token::new("dr").unwrap(),
    );
    let frame = Frame::new(MacAddr::PEER, MacAddr::PEER, TttPacket::new(header));
    link.inject(Captured::incoming(encode(frame).freeze())).unwrap();

    let mut observer = fast_observer(link);
    let (state, result) = observer.poll(ObserverState::new()).await;
    assert!(matches!(result.unwrap(), Observation::Frame(_)));
    assert_eq!(state.outcome(), Outcome::Draw);
}

// ── Observer on a shared segment ─────────────────────────────────

/// The player's own request as the observer's socket sees it.
fn request_capture(token: &str, round: u32) -> Captured {
    let header = TttHeader::for_move(1, Token::new(token).unwrap());
    let frame = Frame::new(MacAddr::PEER, HOST, TttPacket::tagged(header, round));
    Captured::outgoing(encode(frame).freeze())
}

fn peer_reply(cells: &[u8; 9], status: &str, round: Option<u32>) -> BytesMut {
    let header = TttHeader::new(
        1,
        Token::new("pl").unwrap(),
        Board::from_raw(*cells),
        Token::new(status).unwrap(),
    );
    let packet = match round {
        Some(round) => TttPacket::tagged(header, round),
        None => TttPacket::new(header),
    };
    encode(Frame::new(MacAddr::PEER, MacAddr::PEER, packet))
}

#[tokio::test]
async fn test_observer_prefers_tagged_reply_over_its_request() {
    let (link, mut peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let link = link.with_echo();
    link.inject(request_capture("t5", 4)).unwrap();
    peer.send(&peer_reply(b"X---O----", "pg", Some(4))).await.unwrap();

    let mut observer = fast_observer(link);
    let (state, result) = observer.poll(ObserverState::new()).await;
    let Observation::Frame(picked) = result.unwrap() else {
        panic!("expected a frame");
    };
    assert_eq!(picked.header().board().cells(), b"X---O----");
    assert_eq!(state.board().cells(), b"X---O----");
    assert_eq!(state.last_round(), Some(4));
}

#[tokio::test]
async fn test_observer_prefers_untagged_reply_over_its_request() {
    let (link, mut peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let link = link.with_echo();
    link.inject(request_capture("t3", 1)).unwrap();
    peer.send(&peer_reply(b"XXXOO----", "pv", None)).await.unwrap();

    let mut observer = fast_observer(link);
    let (state, result) = observer.poll(ObserverState::new()).await;
    assert!(matches!(result.unwrap(), Observation::Frame(_)));
    assert_eq!(state.board().cells(), b"XXXOO----");
    assert_eq!(state.outcome(), Outcome::PlayerWins);
}

#[tokio::test]
async fn test_observer_keeps_reply_over_newer_request() {
    let (link, mut peer) = MemoryLink::pair(HOST, MacAddr::PEER);
    let link = link.with_echo();
    peer.send(&peer_reply(b"OX--X---O", "pg", Some(2))).await.unwrap();
    link.inject(request_capture("t8", 3)).unwrap();

    let mut observer = fast_observer(link);
    let (state, result) = observer.poll(ObserverState::new()).await;
    let Observation::Frame(picked) = result.unwrap() else {
        panic!("expected a frame");
    };
    assert_eq!(picked.packet.round(), Some(2));
    assert_eq!(state.board().cells(), b"OX--X---O");
    assert_eq!(state.outcome(), Outcome::InProgress);
}
