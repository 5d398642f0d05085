//! XK handshake between two threads, with channels standing in for the network.
//!
//! The initiator knows the responder's static key up front and transmits its own; afterwards each
//! side sends one transport message. Run with `RUST_LOG=debug` to watch the state machine.

use std::{
    sync::mpsc::{channel, Receiver, Sender},
    thread,
};

use bytes::Bytes;
use log::info;
use vuvuzella::{generate_keypair, Action, CipherPair, DhChoice, HandshakeState, Role};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const PROTOCOL: &str = "Noise_XK_25519_ChaChaPoly_BLAKE2b";

/// Runs one side's handshake to completion over the given channel ends.
fn handshake(
    mut hs: HandshakeState,
    tx: &Sender<Bytes>,
    rx: &Receiver<Bytes>,
) -> Result<CipherPair, BoxError> {
    let who = hs.role();
    loop {
        match hs.action() {
            Action::WriteMessage => {
                info!("{who:?} writing handshake message");
                tx.send(hs.write_message(None)?)?;
            }
            Action::ReadMessage => {
                let msg = rx.recv()?;
                info!("{who:?} reading handshake message ({} bytes)", msg.len());
                hs.read_message(&msg, true)?;
            }
            Action::Split => {
                if let Some(hash) = hs.handshake_hash() {
                    info!("{who:?} handshake hash {}", hex::encode(hash));
                }
                return Ok(hs.split()?);
            }
            Action::Failed => return Err("handshake cannot progress".into()),
        }
    }
}

fn main() -> Result<(), BoxError> {
    env_logger::init();
    info!("Using protocol: {PROTOCOL}");

    let initiator_static = generate_keypair(DhChoice::Curve25519)?;
    let responder_static = generate_keypair(DhChoice::Curve25519)?;
    info!("Initiator public key = {}", hex::encode(initiator_static.public()));
    info!("Responder public key = {}", hex::encode(responder_static.public()));

    let mut initiator = HandshakeState::new(PROTOCOL, Role::Initiator)?;
    initiator.initialize(None, Some(initiator_static), Some(responder_static.public()), &[])?;
    // The responder learns the initiator's static key during the handshake.
    let mut responder = HandshakeState::new(PROTOCOL, Role::Responder)?;
    responder.initialize(None, Some(responder_static), None, &[])?;

    let (to_responder, from_initiator) = channel::<Bytes>();
    let (to_initiator, from_responder) = channel::<Bytes>();

    let responder_thread = thread::spawn(move || -> Result<(), BoxError> {
        let mut ciphers = handshake(responder, &to_initiator, &from_initiator)?;
        let msg = from_initiator.recv()?;
        let text = ciphers.decrypt(&msg)?;
        info!("Responder got: {}", String::from_utf8_lossy(&text));
        to_initiator.send(ciphers.encrypt(b"Well hello, initiator!")?.into())?;
        Ok(())
    });

    let mut ciphers = handshake(initiator, &to_responder, &from_responder)?;
    to_responder.send(ciphers.encrypt(b"Hiya Responder!")?.into())?;
    let reply = from_responder.recv()?;
    info!("Initiator got: {}", String::from_utf8_lossy(&ciphers.decrypt(&reply)?));

    responder_thread
        .join()
        .map_err(|_| "responder thread panicked")??;
    Ok(())
}
