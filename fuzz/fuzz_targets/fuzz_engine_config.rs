#![no_main]

use griddrag_layout::Board;
use griddrag_runtime::{EngineConfig, GridEngine};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for config in [EngineConfig::from_toml_str(text), EngineConfig::from_json_str(text)]
        .into_iter()
        .flatten()
    {
        let valid = config.validate().is_empty();
        let engine = GridEngine::new(Board::<u8>::new(), config);
        assert_eq!(engine.is_ok(), valid, "engine and validate disagree");
    }
});
