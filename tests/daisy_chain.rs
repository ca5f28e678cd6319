use daisychain::nodes::{
    Blank, ChannelMessage, ChannelStrip, Foreign, Master, PanStrip, PanStripMessage, VuMeter,
};
use daisychain::{Adjacency, ModuleId, Patch, PolyPort, ProcessOrder, Rack, RackConfig, Side};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn strip(rack: &mut Rack, column: i32, volts: f32) -> ModuleId {
    let id = rack.add(ChannelStrip::new(), column).unwrap().id();
    *rack.input_mut(id, ChannelStrip::IN_LEFT).unwrap() = PolyPort::mono(volts);
    id
}

#[test]
fn two_strip_scenario() {
    init_tracing();
    let mut rack = Rack::default();
    let left = strip(&mut rack, 0, 5.0);
    let right = rack.add(ChannelStrip::new(), 1).unwrap().id();

    rack.process_frames(4);

    let relayed = rack.chain_state(right).unwrap().chain.left[0];
    assert!((relayed - 5.0 / 16.0).abs() < 1e-6, "relayed {relayed}");

    let out = rack.output(right, ChannelStrip::OUT_LEFT).unwrap();
    assert_eq!(out.channels, 1);
    assert_eq!(out.voltage(), 0.0);

    assert_eq!(rack.output(left, ChannelStrip::OUT_LEFT).unwrap().voltage(), 5.0);
}

#[test]
fn settled_chain_ignores_processing_order() {
    init_tracing();
    let orders = [
        ProcessOrder::Insertion,
        ProcessOrder::LeftToRight,
        ProcessOrder::RightToLeft,
        ProcessOrder::Columns(vec![1, 3, 0, 2]),
    ];

    let mut settled = Vec::new();
    for order in orders {
        let mut rack = Rack::new(RackConfig::default().with_process_order(order));
        strip(&mut rack, 2, 2.0);
        strip(&mut rack, 0, 8.0);
        strip(&mut rack, 1, 4.0);
        let last = rack.add(Blank::new(), 3).unwrap().id();

        rack.process_frames(5);
        settled.push(rack.chain_state(last).unwrap().chain);
    }

    assert_eq!(settled[0].left[0], 0.875);
    assert!(settled.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn chain_settles_one_hop_per_frame() {
    init_tracing();
    let mut rack = Rack::new(RackConfig::default().with_process_order(ProcessOrder::RightToLeft));
    strip(&mut rack, 0, 16.0);
    let ids: Vec<ModuleId> = (1..4).map(|c| rack.add(Blank::new(), c).unwrap().id()).collect();

    for (hop, id) in ids.iter().enumerate() {
        rack.process();
        assert_eq!(rack.chain_state(*id).unwrap().chain.left[0], 0.0, "hop {hop} arrived early");
    }
    rack.process();
    assert_eq!(rack.chain_state(ids[2]).unwrap().chain.left[0], 1.0);
}

#[test]
fn incompatible_neighbor_is_treated_as_absent() {
    init_tracing();
    let mut rack = Rack::default();
    let a = strip(&mut rack, 0, 5.0);
    let foreign = rack.add(Foreign::new(), 1).unwrap().id();
    let b = rack.add(ChannelStrip::new(), 2).unwrap().id();

    rack.process_frames(4);

    assert_eq!(rack.links(a).unwrap().right, Adjacency::Incompatible);
    assert_eq!(rack.links(b).unwrap().left, Adjacency::Incompatible);
    assert_eq!(rack.links(foreign).unwrap().left, Adjacency::Incompatible);
    assert!(rack.chain_state(b).unwrap().chain.is_silent());
    assert!(!rack.chain_state(b).unwrap().link_left);
}

#[test]
fn link_lights_refresh_at_the_reduced_rate() {
    init_tracing();
    let mut rack = Rack::default();
    let a = rack.add(ChannelStrip::new(), 0).unwrap().id();
    let b = rack.add(ChannelStrip::new(), 1).unwrap().id();

    rack.process_frames(511);
    assert!(rack.lights(a).unwrap().iter().all(|l| *l == 0.0));

    rack.process();
    let lights = rack.lights(a).unwrap();
    assert_eq!(lights[ChannelStrip::LIGHT_LINK_LEFT], 0.0);
    assert_eq!(lights[ChannelStrip::LIGHT_LINK_RIGHT], ChannelStrip::LINK_BRIGHTNESS);
    let lights = rack.lights(b).unwrap();
    assert_eq!(lights[ChannelStrip::LIGHT_LINK_LEFT], ChannelStrip::LINK_BRIGHTNESS);
    assert_eq!(lights[ChannelStrip::LIGHT_LINK_RIGHT], 0.0);
}

#[test]
fn mute_button_toggles_through_the_handle() {
    init_tracing();
    let mut rack = Rack::default();
    let mut handle = rack.add(ChannelStrip::new(), 0).unwrap();
    let id = handle.id();
    *rack.input_mut(id, ChannelStrip::IN_LEFT).unwrap() = PolyPort::with_voltages(&[1.0, 2.0, 3.0]);

    rack.process();
    assert_eq!(rack.output(id, ChannelStrip::OUT_LEFT).unwrap().channels, 3);

    handle.send(ChannelMessage::SetMuteButton(1.0)).unwrap();
    rack.process();
    let out = rack.output(id, ChannelStrip::OUT_LEFT).unwrap();
    assert_eq!(out.channels, 1);
    assert_eq!(out.voltage(), 0.0);

    // holding the button does not toggle again
    rack.process_frames(3);
    assert!(rack.module::<ChannelStrip>(id).unwrap().is_muted());

    handle.send(ChannelMessage::SetMuteButton(0.0)).unwrap();
    handle.send(ChannelMessage::SetMuteButton(1.0)).unwrap();
    rack.process();
    assert!(rack.module::<ChannelStrip>(id).unwrap().is_muted());

    handle.send(ChannelMessage::SetMuteButton(0.0)).unwrap();
    rack.process();
    handle.send(ChannelMessage::SetMuteButton(1.0)).unwrap();
    rack.process();
    assert!(!rack.module::<ChannelStrip>(id).unwrap().is_muted());
}

#[test]
fn pan_strip_into_master() {
    init_tracing();
    let mut rack = Rack::default();
    let mut pan = rack.add(PanStrip::new(), 0).unwrap();
    *rack.input_mut(pan.id(), PanStrip::IN_LEFT).unwrap() = PolyPort::mono(4.0);
    let master = rack.add(Master::new(), 1).unwrap().id();

    pan.send(PanStripMessage::SetPan(-1.0)).unwrap();
    rack.process_frames(3);

    let left = rack.output(master, Master::OUT_LEFT).unwrap().voltage();
    let right = rack.output(master, Master::OUT_RIGHT).unwrap().voltage();
    assert!((left - 4.0).abs() < 1e-5, "left {left}");
    assert!(right.abs() < 1e-5, "right {right}");

    pan.send(PanStripMessage::SetMuteSwitch(true)).unwrap();
    rack.process_frames(3);
    assert_eq!(rack.output(master, Master::OUT_LEFT).unwrap().voltage(), 0.0);
}

#[test]
fn meter_relays_between_strip_and_master() {
    init_tracing();
    let mut rack = Rack::default();
    strip(&mut rack, 0, 10.0);
    let meter = rack.add(VuMeter::new(), 1).unwrap().id();
    let master = rack.add(Master::new(), 2).unwrap().id();

    rack.process_frames(512);

    assert_eq!(rack.output(master, Master::OUT_LEFT).unwrap().voltage(), 10.0);
    let (left, right) = rack.module::<VuMeter>(meter).unwrap().levels();
    assert!(left > 0.9, "left level {left}");
    assert_eq!(right, 0.0);

    let lights = rack.lights(meter).unwrap();
    assert_eq!(lights[VuMeter::LIGHT_LINK_LEFT], VuMeter::LINK_BRIGHTNESS);
    assert_eq!(lights[VuMeter::LIGHT_LINK_RIGHT], VuMeter::LINK_BRIGHTNESS);
}

#[test]
fn master_is_a_chain_terminus() {
    init_tracing();
    let mut rack = Rack::default();
    let master = rack.add(Master::new(), 0).unwrap().id();
    let after = rack.add(ChannelStrip::new(), 1).unwrap().id();

    let links = rack.links(master).unwrap();
    assert_eq!(links.right, Adjacency::Incompatible);
    assert_eq!(rack.links(after).unwrap().side(Side::Left), Adjacency::Incompatible);
}

#[test]
fn patch_survives_json() {
    init_tracing();
    let mut rack = Rack::new(RackConfig::default().with_sample_rate(44_100.0));
    let mut handle = rack.add(ChannelStrip::new(), 0).unwrap();
    rack.add(Blank::new(), 1).unwrap();
    rack.add(Master::new(), 2).unwrap();

    handle.send(ChannelMessage::SetMuteButton(1.0)).unwrap();
    rack.process();

    let json = rack.to_patch().to_json().unwrap();
    let restored = Rack::from_patch(&Patch::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.config().sample_rate, 44_100.0);
    assert_eq!(restored.len(), 3);
    let strip = restored.module_at(0).unwrap();
    assert!(restored.module::<ChannelStrip>(strip).unwrap().is_muted());
    assert!(!restored.module::<Master>(restored.module_at(2).unwrap()).unwrap().is_muted());
}

#[test]
fn loaded_modules_accept_new_handles() {
    init_tracing();
    let mut rack = Rack::default();
    rack.add(ChannelStrip::new(), 0).unwrap();
    let mut loaded = Rack::from_patch(&rack.to_patch()).unwrap();

    let id = loaded.module_at(0).unwrap();
    let mut handle = loaded.control::<ChannelStrip>(id).unwrap();
    handle.send(ChannelMessage::SetLevel(0.5)).unwrap();
    loaded.process();

    assert_eq!(loaded.module::<ChannelStrip>(id).unwrap().level(), 0.5);
}
