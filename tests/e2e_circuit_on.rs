//! §8 scenario 1, end to end: `setCircuitState(6, true)` against a
//! Pentair-16 board over a loopback port, a simulated peer that acks
//! the frame, and the optimistic Change Engine commit that follows a
//! successful dispatch.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use poolbridge::board::{Board, CircuitDesired, Intent};
use poolbridge::change::ChangeEngine;
use poolbridge::codec::encoder;
use poolbridge::codec::{Frame, FrameVariant};
use poolbridge::controller_type::ControllerType;
use poolbridge::delay::DelayManager;
use poolbridge::model::circuit::{CircuitConfig, CircuitFunction, CircuitState};
use poolbridge::model::graph::{PoolConfig, PoolState};
use poolbridge::model::EquipmentModel;
use poolbridge::port::{loopback, Port, PRIMARY_PORT};
use poolbridge::transaction::{PacerConfig, Priority, RetryPolicy, TransactionEngine};
use poolbridge::PoolBridge;

fn model_with_circuit(id: u32) -> EquipmentModel {
    let mut state = PoolState::default();
    state.circuits.upsert(
        id,
        CircuitState {
            id,
            is_on: false,
            end_time: None,
            lighting_theme: None,
        },
    );
    let mut config = PoolConfig::default();
    config.circuits.upsert(
        id,
        CircuitConfig {
            id,
            name: "Pool".into(),
            function: CircuitFunction::Pool,
            show_in_features: true,
            freeze_protect: false,
            egg_timer_minutes: 0,
        },
    );
    EquipmentModel::new(config, state)
}

#[tokio::test]
async fn circuit_on_dispatch_commits_optimistically_after_ack() {
    let (mine, mut theirs) = loopback::pair();
    let port = Arc::new(Port::new_loopback(PRIMARY_PORT, mine));

    let (spontaneous_tx, _spontaneous_rx) = mpsc::channel(8);
    let engine = Arc::new(TransactionEngine::new(
        PRIMARY_PORT,
        Arc::clone(&port),
        PacerConfig::default(),
        RetryPolicy::default(),
        spontaneous_tx,
    ));
    tokio::spawn(Arc::clone(&engine).run());

    // Feed inbound bytes (the simulated controller's ack) through the
    // decoder and into the engine, same as `context::read_pump` does in
    // the daemon.
    {
        let port = Arc::clone(&port);
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let mut decoder = poolbridge::codec::decoder::FrameDecoder::new(FrameVariant::Pentair16);
            loop {
                let Ok(chunk) = port.read_chunk().await else {
                    return;
                };
                let now = std::time::Instant::now();
                for byte in chunk {
                    if let Some(event) = decoder.push(byte, now) {
                        engine.on_decode_event(event).await;
                    }
                }
            }
        });
    }

    // Simulated controller: read the wire frame, ack it with the same
    // circuit id and the requested on-flag echoed back.
    tokio::spawn(async move {
        let mut header = [0u8; 9]; // preamble(3) + A5 + flag + dest + src + action + length
        theirs.read_exact(&mut header).await.unwrap();
        let payload_len = header[8] as usize;
        let mut rest = vec![0u8; payload_len + 2]; // payload + checksum
        theirs.read_exact(&mut rest).await.unwrap();

        let circuit_id = rest[0];
        let on_flag = rest[1];
        let ack = Frame::new(
            FrameVariant::Pentair16,
            0x00,
            0x10, // src == the board's dest address, matching the outbound ResponseKey
            0x86, // ACTION_CIRCUIT_STATE
            vec![circuit_id, on_flag],
        );
        theirs.write_all(&encoder::encode(&ack)).await.unwrap();
    });

    let board = Arc::new(Board::new(ControllerType::IntelliTouch, 0x10, 0x00));
    let delay = Arc::new(DelayManager::new(Vec::new()));

    let dir = tempfile::tempdir().unwrap();
    let change = Arc::new(ChangeEngine::new(
        model_with_circuit(6),
        dir.path().join("pool-config.json"),
        dir.path().join("pool-state.json"),
    ));
    let (mut events, _overflow) = change.events().subscribe();

    let bridge = PoolBridge::new(board, Arc::clone(&engine), Arc::clone(&change), delay);

    bridge
        .dispatch(
            Intent::SetCircuitState {
                id: 6,
                desired: CircuitDesired::On,
            },
            Priority::User,
        )
        .await
        .expect("ack'd circuit-state command should succeed and commit");

    let event = events.recv().await.expect("circuit event published");
    assert_eq!(event.topic, "circuit");
    assert_eq!(event.post_image, serde_json::json!({"id": 6, "isOn": true}));
}
