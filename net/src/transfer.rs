//! Scene transfer
//!
//! Reliable delivery of scene text over a lossy transport. The initiator
//! sends one fragment per line and answers missing line requests; the
//! responder requests every unfilled slot on each timer tick.

use crate::*;
use rayfarm_core::camera::View;
use std::net::SocketAddr;
use std::time::Duration;

/// Initiator side of a scene transfer. Holds the encoded fragments so any
/// of them can be resent.
#[derive(Clone, Debug)]
pub struct SceneSender {
    fragments: Vec<Vec<u8>>,
}

impl SceneSender {
    /// Fragment scene text. An empty scene is sent as a single empty line.
    ///
    /// * `lines` - Scene text.
    /// * `view`  - Resolution to attach to every fragment, if any.
    pub fn new(lines: &[String], view: Option<View>) -> Result<Self, NetError> {
        let empty = [String::new()];
        let lines = if lines.is_empty() { &empty[..] } else { lines };
        let total = u32::try_from(lines.len())
            .map_err(|_| NetError::Malformed(format!("scene has {} lines", lines.len())))?;

        let mut fragments = Vec::with_capacity(lines.len());
        for (i, payload) in lines.iter().enumerate() {
            if payload.contains(FIELD_SEPARATOR) {
                return Err(NetError::Malformed(format!(
                    "scene line {} contains '{FIELD_SEPARATOR}'",
                    i + 1
                )));
            }

            let fragment = SceneLine {
                index: i as u32 + 1,
                total,
                payload: payload.clone(),
                view,
            }
            .encode();
            if fragment.len() > MAX_DATAGRAM {
                return Err(NetError::Malformed(format!("scene line {} is too long", i + 1)));
            }
            fragments.push(fragment);
        }

        Ok(Self { fragments })
    }

    /// Returns the number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns true if there are no fragments. Never the case for a sender
    /// built with `new()`.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Returns an encoded fragment.
    ///
    /// * `index` - 1-based line index.
    pub fn fragment(&self, index: u32) -> Option<&[u8]> {
        let i = (index as usize).checked_sub(1)?;
        self.fragments.get(i).map(Vec::as_slice)
    }

    /// Send every fragment once.
    ///
    /// * `transport` - Transport to send on.
    /// * `to`        - Responder address.
    pub fn send_all<T: Transport + ?Sized>(&self, transport: &T, to: SocketAddr) -> Result<(), NetError> {
        debug!("Sending {} scene lines to {to}", self.fragments.len());
        for fragment in self.fragments.iter() {
            transport.send_to(fragment, to)?;
        }
        Ok(())
    }

    /// Resend the fragment named by a missing line request. Returns false
    /// if the index is out of range.
    ///
    /// * `transport` - Transport to send on.
    /// * `to`        - Responder address.
    /// * `missing`   - 0-based line index from the request.
    pub fn resend<T: Transport + ?Sized>(&self, transport: &T, to: SocketAddr, missing: u32) -> Result<bool, NetError> {
        match self.fragments.get(missing as usize) {
            Some(fragment) => {
                trace!("Resending scene line {} to {to}", missing + 1);
                transport.send_to(fragment, to)?;
                Ok(true)
            }
            None => {
                debug!("Ignoring request for scene line {missing} from {to}");
                Ok(false)
            }
        }
    }
}

/// A scene received in full.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedScene {
    /// Initiator address.
    pub sender: SocketAddr,

    /// Scene text.
    pub lines: Vec<String>,

    /// Resolution carried by the fragments, if any.
    pub view: Option<View>,
}

/// Responder side of a scene transfer. Bound to the sender of the first
/// accepted fragment; fragments from anyone else are ignored.
#[derive(Clone, Debug, Default)]
pub struct SceneReceiver {
    sender: Option<SocketAddr>,
    slots: Vec<Option<String>>,
    filled: usize,
    view: Option<View>,
}

impl SceneReceiver {
    /// Create an unbound receiver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the address the transfer is bound to.
    pub fn sender(&self) -> Option<SocketAddr> {
        self.sender
    }

    /// Store a fragment. Returns false if it was ignored. Storing the same
    /// line twice leaves the scene unchanged.
    ///
    /// * `line` - Decoded fragment.
    /// * `from` - Fragment sender.
    pub fn accept(&mut self, line: SceneLine, from: SocketAddr) -> bool {
        match self.sender {
            None => {
                debug!("Receiving {} scene lines from {from}", line.total);
                self.sender = Some(from);
                self.slots = vec![None; line.total as usize];
                self.view = line.view;
            }
            Some(sender) if sender != from => {
                debug!("Ignoring scene line from {from}, bound to {sender}");
                return false;
            }
            Some(_) => (),
        }

        if line.total as usize != self.slots.len() {
            debug!(
                "Ignoring scene line {} with total {}, expected {}",
                line.index,
                line.total,
                self.slots.len()
            );
            return false;
        }

        match (line.index as usize).checked_sub(1).and_then(|i| self.slots.get_mut(i)) {
            Some(slot) => {
                if slot.is_none() {
                    self.filled += 1;
                }
                trace!("Received scene line {} of {}", line.index, line.total);
                *slot = Some(line.payload);
                true
            }
            None => false,
        }
    }

    /// Returns the 0-based indices of the lines not yet received.
    pub fn missing(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Returns true once every line has been received.
    pub fn is_complete(&self) -> bool {
        self.sender.is_some() && self.filled == self.slots.len()
    }

    /// Send one missing line request per unfilled slot. Returns the number
    /// of requests sent.
    ///
    /// * `transport` - Transport to send on.
    pub fn request_missing<T: Transport + ?Sized>(&self, transport: &T) -> Result<usize, NetError> {
        let sender = match self.sender {
            Some(sender) => sender,
            None => return Ok(0),
        };

        let missing = self.missing();
        if !missing.is_empty() {
            debug!("Requesting {} missing scene lines from {sender}", missing.len());
        }
        for index in missing.iter() {
            transport.send_to(&Message::MissingLine(*index).encode(), sender)?;
        }
        Ok(missing.len())
    }

    /// Returns the received scene once complete.
    pub fn finish(self) -> Option<ReceivedScene> {
        if !self.is_complete() {
            return None;
        }
        let sender = self.sender?;
        let lines = self.slots.into_iter().collect::<Option<Vec<String>>>()?;
        Some(ReceivedScene {
            sender,
            lines,
            view: self.view,
        })
    }

    /// Run the responder until the scene is complete. Waits indefinitely
    /// for the first fragment; datagrams that are not scene fragments are
    /// ignored.
    ///
    /// * `transport` - Transport to listen on.
    /// * `tick`      - Period of the missing line requests.
    pub fn receive<T: Transport + ?Sized>(mut self, transport: &T, tick: Duration) -> Result<ReceivedScene, NetError> {
        let mut ticker = Ticker::new(tick);
        loop {
            match ticker.wait(transport)? {
                Event::Datagram(Datagram { payload, from }) => match SceneLine::decode(&payload) {
                    Ok(line) => {
                        self.accept(line, from);
                        if self.is_complete() {
                            break;
                        }
                    }
                    Err(e) => debug!("Ignoring datagram from {from}: {e}"),
                },
                Event::Tick => {
                    self.request_missing(transport)?;
                }
            }
        }

        self.finish()
            .ok_or_else(|| NetError::Malformed("scene transfer ended incomplete".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rayfarm_core::app::Granularity;
    use std::collections::HashSet;
    use std::thread;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn decoded(sender: &SceneSender, index: u32) -> SceneLine {
        SceneLine::decode(sender.fragment(index).expect("fragment")).expect("valid line")
    }

    #[test]
    fn rejects_separator_in_payload() {
        assert!(matches!(
            SceneSender::new(&lines(&["view 2 2", "a~b"]), None),
            Err(NetError::Malformed(_))
        ));
    }

    #[test]
    fn empty_scene_sends_one_line() {
        let sender = SceneSender::new(&[], None).expect("valid scene");
        assert_eq!(sender.len(), 1);
        assert_eq!(sender.fragment(1), Some(&b"1~1~"[..]));
        assert_eq!(sender.fragment(0), None);
        assert_eq!(sender.fragment(2), None);
    }

    #[test]
    fn binds_to_first_sender() {
        let sender = SceneSender::new(&lines(&["a", "b"]), None).expect("valid scene");
        let mut receiver = SceneReceiver::new();
        assert!(receiver.accept(decoded(&sender, 2), addr(1)));
        assert_eq!(receiver.sender(), Some(addr(1)));
        assert!(!receiver.accept(decoded(&sender, 1), addr(2)));
        assert_eq!(receiver.missing(), vec![0]);
        assert!(receiver.accept(decoded(&sender, 1), addr(1)));
        assert!(receiver.is_complete());
    }

    #[test]
    fn ignores_mismatched_total() {
        let mut receiver = SceneReceiver::new();
        let first = SceneLine {
            index: 1,
            total: 2,
            payload: "a".to_string(),
            view: None,
        };
        let other = SceneLine {
            index: 3,
            total: 3,
            payload: "c".to_string(),
            view: None,
        };
        assert!(receiver.accept(first, addr(1)));
        assert!(!receiver.accept(other, addr(1)));
        assert_eq!(receiver.missing(), vec![1]);
    }

    #[test]
    fn carries_view() {
        let sender = SceneSender::new(&lines(&["x"]), Some(View::new(3, 2))).expect("valid scene");
        let mut receiver = SceneReceiver::new();
        receiver.accept(decoded(&sender, 1), addr(1));
        let scene = receiver.finish().expect("complete");
        assert_eq!(scene.view, Some(View::new(3, 2)));
        assert_eq!(scene.lines, lines(&["x"]));
    }

    #[test]
    fn incomplete_has_no_scene() {
        assert!(SceneReceiver::new().finish().is_none());
        assert!(!SceneReceiver::new().is_complete());
    }

    #[test]
    fn requests_missing_lines() {
        let network = LocalNetwork::new();
        let initiator = network.endpoint();
        let responder = network.endpoint();
        let sender = SceneSender::new(&lines(&["a", "b", "c", "d"]), None).expect("valid scene");

        let mut receiver = SceneReceiver::new();
        receiver.accept(decoded(&sender, 1), initiator.local_addr());
        receiver.accept(decoded(&sender, 3), initiator.local_addr());
        assert_eq!(receiver.request_missing(&responder).expect("send"), 2);

        let protocol = Protocol::new(Granularity::Row, View::new(1, 1)).expect("valid protocol");
        let mut requested = vec![];
        while let Some(d) = initiator.recv_timeout(Duration::from_millis(50)).expect("recv") {
            assert_eq!(d.from, responder.local_addr());
            match protocol.decode_at_coordinator(&d.payload) {
                Some(Message::MissingLine(i)) => requested.push(i),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(requested, vec![1, 3]);
    }

    #[test]
    fn completes_over_lossy_network() {
        let network = LocalNetwork::with_loss(0.3, 11);
        let initiator = network.endpoint();
        let responder = network.endpoint();
        let responder_addr = responder.local_addr();
        let text: Vec<String> = (0..40).map(|i| format!("sphere {i} 0 0 1 shiny")).collect();
        let sender = SceneSender::new(&text, None).expect("valid scene");
        let protocol = Protocol::new(Granularity::Row, View::new(1, 1)).expect("valid protocol");

        let handle = thread::spawn(move || SceneReceiver::new().receive(&responder, Duration::from_millis(5)));

        sender.send_all(&initiator, responder_addr).expect("send");
        let mut ticker = Ticker::new(Duration::from_millis(5));
        while !handle.is_finished() {
            match ticker.wait(&initiator).expect("wait") {
                Event::Datagram(d) => {
                    if let Some(Message::MissingLine(i)) = protocol.decode_at_coordinator(&d.payload) {
                        sender.resend(&initiator, d.from, i).expect("send");
                    }
                }
                Event::Tick => {
                    sender.resend(&initiator, responder_addr, 0).expect("send");
                }
            }
        }

        let scene = handle.join().expect("responder thread").expect("complete scene");
        assert_eq!(scene.sender, initiator.local_addr());
        assert_eq!(scene.lines, text);
    }

    proptest! {
        #[test]
        fn eventually_complete_under_loss(
            text in prop::collection::vec("[a-z0-9 .]{0,12}", 1..30),
            dropped in prop::collection::hash_set(0_u32..30, 0..30),
        ) {
            let sender = SceneSender::new(&text, None).expect("valid scene");
            let total = sender.len() as u32;
            let dropped: HashSet<u32> = dropped.into_iter().filter(|i| *i < total).collect();
            let from = addr(9);

            let mut receiver = SceneReceiver::new();
            for i in (0..total).filter(|i| !dropped.contains(i)) {
                receiver.accept(decoded(&sender, i + 1), from);
            }

            // Everything lost: the initiator resends the first line.
            if receiver.sender().is_none() {
                receiver.accept(decoded(&sender, 1), from);
            }
            for i in receiver.missing() {
                prop_assert!(dropped.contains(&i));
                receiver.accept(decoded(&sender, i + 1), from);
            }

            let scene = receiver.finish().expect("complete");
            prop_assert_eq!(scene.lines, text);
        }

        #[test]
        fn duplicates_do_not_change_scene(
            text in prop::collection::vec("[a-z0-9 .]{0,12}", 1..20),
            repeats in prop::collection::vec(0_u32..20, 0..40),
        ) {
            let sender = SceneSender::new(&text, None).expect("valid scene");
            let total = sender.len() as u32;
            let from = addr(9);

            let mut receiver = SceneReceiver::new();
            for i in 1..=total {
                receiver.accept(decoded(&sender, i), from);
            }
            for i in repeats.into_iter().filter(|i| *i < total) {
                receiver.accept(decoded(&sender, i + 1), from);
                prop_assert!(receiver.is_complete());
            }

            let scene = receiver.finish().expect("complete");
            prop_assert_eq!(scene.lines, text);
        }
    }
}
