//! Example: a small rack of chained strips
//!
//! Two strips and a meter feed the master through the daisy chain. The demo
//! prints the master output while the chain settles, mutes one strip, then
//! saves the rack as a patch.
//!
//! Run with: cargo run --example rack_demo

use daisychain::nodes::{ChannelMessage, ChannelStrip, Master, PanStrip, PanStripMessage, VuMeter};
use daisychain::{PolyPort, Rack, RackConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut rack = Rack::new(RackConfig::default().with_light_division(4));

    let mut kick = rack.add(ChannelStrip::new().with_level(0.8), 0)?;
    let mut pad = rack.add(PanStrip::new(), 1)?;
    let meter = rack.add(VuMeter::new(), 2)?;
    let master = rack.add(Master::new(), 3)?;

    if let Some(port) = rack.input_mut(kick.id(), ChannelStrip::IN_LEFT) {
        *port = PolyPort::mono(5.0);
    }
    if let Some(port) = rack.input_mut(pad.id(), PanStrip::IN_LEFT) {
        *port = PolyPort::with_voltages(&[2.0, 1.0, -1.0]);
    }
    pad.send(PanStripMessage::SetPan(-0.5)).ok();

    let print = |rack: &Rack, label: &str| {
        let left = rack.output(master.id(), Master::OUT_LEFT).map(|p| p.lanes().to_vec());
        let right = rack.output(master.id(), Master::OUT_RIGHT).map(|p| p.lanes().to_vec());
        println!("{label:>8}: L {left:?} R {right:?}");
    };

    for frame in 0..4 {
        rack.process();
        print(&rack, &format!("frame {frame}"));
    }

    if let Some(meter) = rack.module::<VuMeter>(meter.id()) {
        println!("   meter: {:?}", meter.levels());
    }

    // press and release the kick's mute button
    kick.send(ChannelMessage::SetMuteButton(1.0)).ok();
    rack.process();
    kick.send(ChannelMessage::SetMuteButton(0.0)).ok();
    rack.process_frames(4);
    print(&rack, "muted");

    println!("{}", rack.to_patch().to_json()?);
    Ok(())
}
