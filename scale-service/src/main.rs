//! Host process for the scale measurement core: bootstraps logging and
//! process identity through `tfc::progbase`/`tfc::logger`, loads
//! configuration through `tfc::confman::ConfMan`, drives `scale-core`'s
//! `Plant` on a fixed tick, publishes derived values over
//! `tfc::ipc::Signal`, and exposes the command surface as a `zbus`
//! interface -- the same shape as the teacher's `operations` binary, with
//! an EtherCAT bus cycle swapped for a scale tick.

mod adc;
mod config;
mod interface;
mod runtime;
mod store;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use scale_core::adc::ScriptedSource;
use scale_core::sensor::SensorId;
use tfc::ipc::{Base, Signal};
use tokio::time::{interval, Duration, MissedTickBehavior};

use config::ScaleConfig;
use interface::ScaleInterface;
use runtime::{plant_from_config, Runtime};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tfc::progbase::init();
    tfc::logger::init_combined_logger();

    log::info!("starting {} ({})", tfc::progbase::proc_name(), tfc::progbase::exe_name());

    let connection = zbus::connection::Builder::system()?
        .name(format!("is.centroid.scale.{}", tfc::progbase::proc_name()))?
        .build()
        .await?;

    let mut conf_man = tfc::confman::ConfMan::<ScaleConfig>::new(connection.clone(), "scale").await;
    let config = conf_man.read().with_default(ScaleConfig::default()).clone();

    let plant = plant_from_config(&config);
    let runtime = Arc::new(RwLock::new(Runtime::new(plant)));

    let interface = ScaleInterface {
        runtime: runtime.clone(),
    };
    connection
        .object_server()
        .at("/is/centroid/Scale", interface)
        .await?;

    let mut gross_signals: HashMap<SensorId, Signal<f64>> = HashMap::new();
    let mut status_signals: HashMap<SensorId, Signal<u8>> = HashMap::new();
    for sensor_cfg in &config.sensors {
        let id = SensorId(sensor_cfg.id);
        let base_name = format!("scale.{}.gross", sensor_cfg.id);
        gross_signals.insert(
            id,
            Signal::new(connection.clone(), Base::new(&base_name, Some("Gross weight"))).await?,
        );
        let status_name = format!("scale.{}.status", sensor_cfg.id);
        status_signals.insert(
            id,
            Signal::new(connection.clone(), Base::new(&status_name, Some("Status byte"))).await?,
        );
    }

    let mut source = adc::RecordingSource::new(ScriptedSource::new());
    let mut tick = interval(Duration::from_millis(config.tick_interval_ms as u64));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        let elapsed_ms = config.tick_interval_ms;

        let readings = {
            let mut rt = runtime.write();
            let readings = rt.plant.tick(elapsed_ms, &mut source, None);
            for (id, reading) in &readings {
                if let Some(adc) = source.last.get(id).copied() {
                    rt.note_tick(*id, adc, *reading);
                }
            }
            readings
        };

        for (id, reading) in &readings {
            if let Some(signal) = gross_signals.get_mut(id) {
                if let Err(e) = signal.send(reading.gross as f64).await {
                    log::warn!(target: "scale_service", "failed to publish gross signal for sensor {}: {e}", id.0);
                }
            }
            if let Some(signal) = status_signals.get_mut(id) {
                if let Err(e) = signal.send(reading.status.bits() as u8).await {
                    log::warn!(target: "scale_service", "failed to publish status signal for sensor {}: {e}", id.0);
                }
            }
        }
    }
}
