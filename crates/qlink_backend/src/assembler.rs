//! Run-request assembly.
//!
//! Turns a program list plus per-call options into one or more wire-format
//! job payloads. Everything here runs before any network call: tag and
//! feature validation, option merging, the deprecated-`id` rewrite, and
//! chunking of oversized program lists.

use crate::backend::BackendError;
use crate::encode;
use crate::job::COMPOSITE_TAG_PREFIX;
use crate::options::{RunConfig, RunOptions};
use crate::properties::BackendProperties;
use qlink_client::Configuration;
use qlink_core::{Instruction, Program};
use serde::Serialize;

/// One program entry of a job payload
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayloadProgram {
    /// Gate-level program as OpenQASM 3.0 text
    Qasm3 {
        /// Program name
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// OpenQASM 3.0 source
        program: String,
    },

    /// Pulse-level program in JSON form
    Pulse {
        /// Program name
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Serialized schedule
        schedule: serde_json::Value,
    },
}

impl PayloadProgram {
    /// Encode a single program for the wire
    pub fn from_program(program: &Program) -> Self {
        match program {
            Program::Circuit(circuit) => PayloadProgram::Qasm3 {
                name: circuit.name().map(str::to_string),
                program: encode::circuit_to_qasm3(circuit),
            },
            Program::Schedule(schedule) => PayloadProgram::Pulse {
                name: schedule.name.clone(),
                schedule: encode::schedule_to_value(schedule),
            },
        }
    }
}

/// One wire-format job payload
#[derive(Debug, Clone, Serialize)]
pub struct JobPayload {
    /// Encoded programs, in submission order
    pub programs: Vec<PayloadProgram>,

    /// Consolidated run configuration
    pub config: RunConfig,

    /// User header, copied verbatim into the result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<serde_json::Value>,
}

/// The outcome of assembling a run request
#[derive(Debug)]
pub struct Assembly {
    /// One payload per job; more than one means a composite submission
    pub payloads: Vec<JobPayload>,

    /// Unrecognized option keys that were passed through
    pub unknown_options: Vec<String>,
}

impl Assembly {
    /// True when the program list was split into multiple payloads
    pub fn is_chunked(&self) -> bool {
        self.payloads.len() > 1
    }
}

/// Validate user-supplied job tags.
///
/// Tags must be non-empty and may not use the reserved composite prefix.
pub fn validate_job_tags(tags: &[String]) -> Result<(), BackendError> {
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(BackendError::Validation(
                "job tags must be non-empty strings".to_string(),
            ));
        }
        if tag.starts_with(COMPOSITE_TAG_PREFIX) {
            return Err(BackendError::Validation(format!(
                "the '{}' tag prefix is reserved",
                COMPOSITE_TAG_PREFIX
            )));
        }
    }
    Ok(())
}

/// Replace deprecated `id` instructions with equivalent `delay`s, in place.
///
/// Applies only when the backend accepts `delay`. The replacement duration
/// is the backend's `sx` gate length on the same qubit, converted to `dt`
/// cycles. The deprecation warning is emitted at most once per backend
/// instance via the `warning_issued` flag.
///
/// Returns the number of instructions replaced.
pub fn substitute_id_instructions(
    programs: &mut [Program],
    configuration: &Configuration,
    properties: Option<&BackendProperties>,
    warning_issued: &mut bool,
) -> usize {
    if !configuration.supports_instruction("delay") {
        return 0;
    }

    let has_id = programs
        .iter()
        .filter_map(|p| p.as_circuit())
        .any(|c| c.contains_instruction("id"));
    if !has_id {
        return 0;
    }

    if !*warning_issued {
        log::warn!(
            "Support for the 'id' instruction has been deprecated on hardware backends. \
             Any 'id' instructions will be replaced with their equivalent 'delay' \
             instruction. Please use 'delay' directly instead."
        );
        *warning_issued = true;
    }

    let dt = configuration.dt;
    let mut replaced = 0;
    for program in programs.iter_mut() {
        let Some(circuit) = program.as_circuit_mut() else {
            continue;
        };
        for instruction in circuit.instructions_mut() {
            if let Instruction::Id(qubit) = *instruction {
                let cycles = match (properties.and_then(|p| p.gate_length("sx", qubit)), dt) {
                    (Some(length), Some(dt)) if dt > 0.0 => (length / dt).round() as u64,
                    _ => 0,
                };
                *instruction = Instruction::Delay(qubit, cycles);
                replaced += 1;
            }
        }
    }
    replaced
}

/// Effective chunking threshold: the smaller of the server-declared and
/// caller-declared maxima, when either is present
pub fn effective_chunk_size(
    configuration: &Configuration,
    options: &RunOptions,
) -> Option<usize> {
    match (configuration.max_experiments, options.max_programs_per_job) {
        (Some(backend_max), Some(caller_max)) => Some(backend_max.min(caller_max)),
        (Some(backend_max), None) => Some(backend_max),
        (None, Some(caller_max)) => Some(caller_max),
        (None, None) => None,
    }
}

/// Validate a run request.
///
/// Runs every check that must fail fast, before any network call: the
/// program list, job tags, ESP readout support, and the `rep_delay` range.
pub fn validate(
    programs: &[Program],
    configuration: &Configuration,
    options: &RunOptions,
) -> Result<(), BackendError> {
    if programs.is_empty() {
        return Err(BackendError::Validation(
            "at least one program is required".to_string(),
        ));
    }

    validate_job_tags(&options.job_tags)?;

    if options.use_measure_esp == Some(true) && !configuration.measure_esp_enabled {
        return Err(BackendError::Validation(
            "ESP readout is not supported on this backend. Leave 'use_measure_esp' \
             unset or set it to false."
                .to_string(),
        ));
    }

    if let (Some(rep_delay), Some([min, max])) =
        (options.rep_delay, configuration.rep_delay_range)
    {
        if rep_delay < min || rep_delay > max {
            return Err(BackendError::Validation(format!(
                "rep_delay {} is outside the supported range [{}, {}]",
                rep_delay, min, max
            )));
        }
    }

    Ok(())
}

/// Assemble a run request into one or more job payloads.
///
/// Validation runs first ([`validate`]), so assembly of an invalid request
/// never proceeds.
pub fn assemble(
    programs: &[Program],
    configuration: &Configuration,
    options: &RunOptions,
) -> Result<Assembly, BackendError> {
    validate(programs, configuration, options)?;

    let mut config = RunConfig::defaults_for(configuration);
    let unknown_options = options.apply(&mut config);

    // ESP readout defaults to the backend's capability; an unsupported
    // request was already rejected by validate()
    config.use_measure_esp = Some(
        options
            .use_measure_esp
            .unwrap_or(configuration.measure_esp_enabled),
    );

    // Simulators declare their method; inject it unless the caller chose one
    if configuration.simulator
        && config.method.is_none()
        && !config.extra.contains_key("method")
    {
        config.method = configuration.simulation_method.clone();
    }

    let chunk_size = effective_chunk_size(configuration, options);
    let chunks: Vec<&[Program]> = match chunk_size {
        Some(size) if programs.len() > size => programs.chunks(size).collect(),
        _ => vec![programs],
    };

    let payloads = chunks
        .into_iter()
        .map(|chunk| JobPayload {
            programs: chunk.iter().map(PayloadProgram::from_program).collect(),
            config: config.clone(),
            header: options.header.clone(),
        })
        .collect();

    Ok(Assembly {
        payloads,
        unknown_options,
    })
}

/// Generate a fresh client-side composite job id
pub fn composite_job_id() -> String {
    format!("{}{}", COMPOSITE_TAG_PREFIX, uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{hardware_config, simulator_config};
    use qlink_core::CircuitBuilder;
    use serde_json::json;

    fn circuits(n: usize) -> Vec<Program> {
        (0..n)
            .map(|i| {
                CircuitBuilder::with_name(2, format!("circuit_{}", i))
                    .h(0)
                    .cx(0, 1)
                    .measure_all()
                    .build()
                    .into()
            })
            .collect()
    }

    #[test]
    fn test_single_payload_below_threshold() {
        let configuration = hardware_config(); // max_experiments = 3
        let programs = circuits(3);
        let assembly = assemble(&programs, &configuration, &RunOptions::new()).unwrap();

        assert_eq!(assembly.payloads.len(), 1);
        assert!(!assembly.is_chunked());
        assert_eq!(assembly.payloads[0].programs.len(), 3);
    }

    #[test]
    fn test_chunking_splits_into_ceil_n_over_max() {
        let configuration = hardware_config(); // max_experiments = 3
        let programs = circuits(8);
        let assembly = assemble(&programs, &configuration, &RunOptions::new()).unwrap();

        // ceil(8 / 3) = 3 payloads of sizes 3, 3, 2
        assert_eq!(assembly.payloads.len(), 3);
        assert!(assembly.is_chunked());
        let sizes: Vec<usize> = assembly.payloads.iter().map(|p| p.programs.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2]);

        // Concatenation of chunks reconstructs the original order
        let names: Vec<String> = assembly
            .payloads
            .iter()
            .flat_map(|p| p.programs.iter())
            .map(|entry| match entry {
                PayloadProgram::Qasm3 { name, .. } => name.clone().unwrap(),
                PayloadProgram::Pulse { name, .. } => name.clone().unwrap(),
            })
            .collect();
        let expected: Vec<String> = (0..8).map(|i| format!("circuit_{}", i)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_caller_max_tightens_chunking() {
        let configuration = hardware_config(); // max_experiments = 3
        let options = RunOptions::new().with_max_programs_per_job(2);
        let programs = circuits(5);
        let assembly = assemble(&programs, &configuration, &options).unwrap();

        // min(3, 2) = 2 → ceil(5 / 2) = 3 payloads
        assert_eq!(assembly.payloads.len(), 3);
        let sizes: Vec<usize> = assembly.payloads.iter().map(|p| p.programs.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_caller_max_alone_enables_chunking() {
        let mut configuration = hardware_config();
        configuration.max_experiments = None;
        let options = RunOptions::new().with_max_programs_per_job(4);
        let assembly = assemble(&circuits(9), &configuration, &options).unwrap();
        assert_eq!(assembly.payloads.len(), 3);
    }

    #[test]
    fn test_no_threshold_never_chunks() {
        let mut configuration = hardware_config();
        configuration.max_experiments = None;
        let assembly = assemble(&circuits(50), &configuration, &RunOptions::new()).unwrap();
        assert_eq!(assembly.payloads.len(), 1);
        assert_eq!(assembly.payloads[0].programs.len(), 50);
    }

    #[test]
    fn test_empty_program_list_rejected() {
        let configuration = hardware_config();
        assert!(matches!(
            assemble(&[], &configuration, &RunOptions::new()),
            Err(BackendError::Validation(_))
        ));
    }

    #[test]
    fn test_tag_validation() {
        assert!(validate_job_tags(&["vqe".to_string(), "iter_7".to_string()]).is_ok());
        assert!(validate_job_tags(&["".to_string()]).is_err());
        assert!(validate_job_tags(&["   ".to_string()]).is_err());
        assert!(validate_job_tags(&[format!("{}abc", COMPOSITE_TAG_PREFIX)]).is_err());
    }

    #[test]
    fn test_esp_unsupported_fails_before_io() {
        let configuration = hardware_config(); // measure_esp_enabled = false
        let options = RunOptions::new().with_use_measure_esp(true);
        let err = assemble(&circuits(1), &configuration, &options).unwrap_err();
        assert!(matches!(err, BackendError::Validation(_)));
        assert!(err.to_string().contains("ESP"));
    }

    #[test]
    fn test_esp_defaults_to_backend_capability() {
        let mut configuration = hardware_config();
        configuration.measure_esp_enabled = true;
        let assembly = assemble(&circuits(1), &configuration, &RunOptions::new()).unwrap();
        assert_eq!(assembly.payloads[0].config.use_measure_esp, Some(true));

        configuration.measure_esp_enabled = false;
        let assembly = assemble(&circuits(1), &configuration, &RunOptions::new()).unwrap();
        assert_eq!(assembly.payloads[0].config.use_measure_esp, Some(false));

        // Explicitly refusing ESP is always allowed
        let options = RunOptions::new().with_use_measure_esp(false);
        let assembly = assemble(&circuits(1), &configuration, &options).unwrap();
        assert_eq!(assembly.payloads[0].config.use_measure_esp, Some(false));
    }

    #[test]
    fn test_rep_delay_range_validation() {
        let configuration = hardware_config(); // rep_delay_range = [0.0, 0.0005]
        let options = RunOptions::new().with_rep_delay(0.001);
        assert!(matches!(
            assemble(&circuits(1), &configuration, &options),
            Err(BackendError::Validation(_))
        ));

        let options = RunOptions::new().with_rep_delay(0.0002);
        assert!(assemble(&circuits(1), &configuration, &options).is_ok());
    }

    #[test]
    fn test_unknown_option_warns_once_not_errors() {
        let configuration = hardware_config();
        let options = RunOptions::new().with_option("noise_amplifier", json!("folding"));
        let assembly = assemble(&circuits(1), &configuration, &options).unwrap();

        assert_eq!(assembly.unknown_options, vec!["noise_amplifier".to_string()]);
        let payload = serde_json::to_value(&assembly.payloads[0]).unwrap();
        assert_eq!(payload["config"]["noise_amplifier"], json!("folding"));
    }

    #[test]
    fn test_simulator_method_injection() {
        let configuration = simulator_config(); // simulation_method = "statevector"
        let assembly = assemble(&circuits(1), &configuration, &RunOptions::new()).unwrap();
        assert_eq!(
            assembly.payloads[0].config.method.as_deref(),
            Some("statevector")
        );

        // Caller's explicit method wins
        let options = RunOptions::new().with_option("method", json!("density_matrix"));
        let assembly = assemble(&circuits(1), &configuration, &options).unwrap();
        assert!(assembly.payloads[0].config.method.is_none());
        let payload = serde_json::to_value(&assembly.payloads[0]).unwrap();
        assert_eq!(payload["config"]["method"], json!("density_matrix"));
    }

    #[test]
    fn test_substitute_id_requires_delay_support() {
        let mut configuration = hardware_config();
        configuration.supported_instructions =
            vec!["cx".into(), "id".into(), "measure".into()];

        let mut programs: Vec<Program> =
            vec![CircuitBuilder::new(1).id(0).measure_all().build().into()];
        let mut warned = false;
        let replaced =
            substitute_id_instructions(&mut programs, &configuration, None, &mut warned);

        assert_eq!(replaced, 0);
        assert!(!warned);
        assert!(programs[0].as_circuit().unwrap().contains_instruction("id"));
    }

    #[test]
    fn test_substitute_id_replaces_in_place_with_sx_length() {
        let configuration = hardware_config(); // dt = 2.2222e-10 s, delay supported
        let properties = crate::testutil::hardware_properties(); // sx length 35.5 ns

        let mut programs: Vec<Program> = vec![
            CircuitBuilder::new(2).id(0).x(1).measure_all().build().into(),
            CircuitBuilder::new(2).id(0).id(1).build().into(),
        ];
        let mut warned = false;
        let replaced = substitute_id_instructions(
            &mut programs,
            &configuration,
            Some(&properties),
            &mut warned,
        );

        assert_eq!(replaced, 3);
        assert!(warned);
        for program in &programs {
            assert!(!program.as_circuit().unwrap().contains_instruction("id"));
        }

        // round(35.5e-9 s / 2.2222e-10 s per dt) = 160 cycles
        let circuit = programs[0].as_circuit().unwrap();
        assert!(circuit
            .instructions()
            .iter()
            .any(|i| matches!(i, Instruction::Delay(0, cycles) if *cycles == 160)));
    }

    #[test]
    fn test_substitute_id_warns_once_per_flag() {
        let configuration = hardware_config();
        let properties = crate::testutil::hardware_properties();
        let mut warned = false;

        let mut first: Vec<Program> = vec![CircuitBuilder::new(1).id(0).build().into()];
        substitute_id_instructions(&mut first, &configuration, Some(&properties), &mut warned);
        assert!(warned);

        // Second call with the flag already set replaces silently
        let mut second: Vec<Program> = vec![CircuitBuilder::new(1).id(0).build().into()];
        let replaced = substitute_id_instructions(
            &mut second,
            &configuration,
            Some(&properties),
            &mut warned,
        );
        assert_eq!(replaced, 1);
        assert!(warned);
    }

    #[test]
    fn test_composite_job_id_shape() {
        let id = composite_job_id();
        assert!(id.starts_with(COMPOSITE_TAG_PREFIX));
        assert!(id.len() > COMPOSITE_TAG_PREFIX.len());
        assert_ne!(composite_job_id(), composite_job_id());
    }
}
