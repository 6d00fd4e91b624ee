use std::io::Write;
use wcls_core::SimChannel;
use wcls_io::{read_events, Geometry, RunConfig, SimChannelWriter};
use wcls_sim::{process_events, DepoFluxWriter, SimDepoSetSource};

const CONFIG: &str = r#"{
    "flux_writer": {
        "anodes": "apa0",
        "field_response": { "speed": 1.6, "origin": 0.0 },
        "sed_label": "largeant"
    },
    "depo_source": { "art_tag": "largeant", "id_is_track": false }
}"#;

const GEOMETRY: &str = r#"{
    "anodes": [{
        "name": "apa0", "ident": 0,
        "faces": [{
            "ident": 0,
            "sensitive": { "min": [0, -100, 0], "max": [1000, 100, 500] },
            "planes": [
                { "index": 0, "origin": [0, 0, 0], "pitch_dir": [0, 0, 1],
                  "pitch": 5.0, "nwires": 100, "first_channel": 0 },
                { "index": 1, "origin": [0, 0, 0], "pitch_dir": [0, 0, 1],
                  "pitch": 5.0, "nwires": 100, "first_channel": 100 },
                { "index": 2, "origin": [0, 0, 0], "pitch_dir": [0, 0, 1],
                  "pitch": 5.0, "nwires": 100, "first_channel": 200 }
            ]
        }]
    }]
}"#;

const EVENTS: &str = r#"{
    "events": [
        { "id": 1, "deposits": { "largeant": [
            { "track_id": 3, "orig_track_id": 1, "midpoint": [1.0, 0.0, 25.25],
              "time": 10250.0, "energy": 0.4, "num_electrons": 100 }
        ] } },
        { "id": 2, "deposits": { "largeant": [] } },
        { "id": 3, "deposits": { "largeant": [
            { "track_id": 5, "midpoint": [1.0, 0.0, 5000.0],
              "time": 10250.0, "energy": 0.4, "num_electrons": 100 }
        ] } }
    ]
}"#;

fn temp_with(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_files_to_csv() {
    let config = RunConfig::from_file(temp_with(CONFIG).path()).unwrap();
    let geometry = Geometry::from_file(temp_with(GEOMETRY).path()).unwrap();
    let mut events = read_events(temp_with(EVENTS).path()).unwrap();

    let anodes = geometry.select(&config.anodes).unwrap();
    let mut source = SimDepoSetSource::new(config.source.clone()).unwrap();
    let mut writer = DepoFluxWriter::new(anodes, config.response, config.flux.clone()).unwrap();
    let total = process_events(events.iter_mut(), &mut source, &mut writer).unwrap();
    // one channel per plane for the first event, nothing for the others
    assert_eq!(total, 3);

    let out = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    let mut csv = SimChannelWriter::create(out.path()).unwrap();
    for event in &events {
        let channels = event.get::<Vec<SimChannel>>("simpleSC").unwrap();
        csv.write_event(event.id(), channels).unwrap();
    }
    csv.flush().unwrap();
    assert_eq!(csv.rows(), 3);

    let contents = std::fs::read_to_string(out.path()).unwrap();
    let rows: Vec<&str> = contents.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("1,50,20,3,100,0.4,1,0,25.25,1"));
    assert!(rows[2].starts_with("1,250,20,"));
}
