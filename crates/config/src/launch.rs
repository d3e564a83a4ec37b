// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch flag emission for the create+start invocation.

use base64::Engine;
use serde_json::Value;

use crate::emit::{bool_or, joined_flag, str_or, uint_or};

/// Default device uuid, incremented nowhere: every instance gets the same
/// token unless the config overrides it.
const DEFAULT_UUID: &str = "699acfc4-c8c4-11e7-882b-5065f31dc101";
const DEFAULT_SERIAL_NUMBER: &str = "CUTTLEFISHCVD01";

#[derive(Clone, Copy)]
struct Display {
    width: u64,
    height: u64,
    dpi: u64,
    refresh_rate_hertz: u64,
}

const DEFAULT_DISPLAY: Display =
    Display { width: 720, height: 1280, dpi: 320, refresh_rate_hertz: 60 };

/// Translate the validated config into launcher flags, joined across
/// instances in order.
pub(crate) fn launch_flags(config: &Value, instances: &[Value]) -> Vec<String> {
    let netsim_bt = match config.get("netsim_bt") {
        Some(Value::Bool(b)) => *b,
        _ => false,
    };
    vec![
        format!("--num_instances={}", instances.len()),
        format!("--netsim_bt={netsim_bt}"),
        joined_flag("cpus", instances, |i| uint_or(i, "/vm/cpus", "2")),
        joined_flag("memory_mb", instances, |i| uint_or(i, "/vm/memory_mb", "2048")),
        joined_flag("vm_manager", instances, vm_manager),
        joined_flag("setupwizard_mode", instances, |i| {
            str_or(i, "/vm/setupwizard_mode", "DISABLED")
        }),
        joined_flag("use_sdcard", instances, |i| bool_or(i, "/vm/use_sdcard", true)),
        joined_flag("uuid", instances, |i| str_or(i, "/vm/uuid", DEFAULT_UUID)),
        joined_flag("enable_sandbox", instances, |i| {
            bool_or(i, "/vm/crosvm/enable_sandbox", false)
        }),
        joined_flag("crosvm_simple_media_device", instances, |i| {
            bool_or(i, "/vm/crosvm/simple_media_device", false)
        }),
        joined_flag("crosvm_v4l2_proxy", instances, |i| str_or(i, "/vm/crosvm/v4l2_proxy", "")),
        joined_flag("custom_actions", instances, custom_actions),
        joined_flag("enable_bootanimation", instances, |i| {
            bool_or(i, "/boot/enable_bootanimation", true)
        }),
        joined_flag("extra_kernel_cmdline", instances, |i| {
            str_or(i, "/boot/kernel/extra_kernel_cmdline", "")
        }),
        joined_flag("serial_number", instances, |i| {
            str_or(i, "/security/serial_number", DEFAULT_SERIAL_NUMBER)
        }),
        joined_flag("guest_enforce_security", instances, |i| {
            bool_or(i, "/security/guest_enforce_security", true)
        }),
        joined_flag("blank_data_image_mb", instances, |i| {
            uint_or(i, "/disk/blank_data_image_mb", "unset")
        }),
        format!("--displays_binproto={}", displays_binproto(instances)),
    ]
}

fn vm_manager(instance: &Value) -> String {
    for (key, manager) in [("crosvm", "crosvm"), ("qemu", "qemu_cli"), ("gem5", "gem5")] {
        if instance.pointer(&format!("/vm/{key}")).is_some() {
            return manager.to_string();
        }
    }
    "crosvm".to_string()
}

fn custom_actions(instance: &Value) -> String {
    match instance.pointer("/vm/custom_actions") {
        Some(actions) => serde_json::to_string(actions).unwrap_or_else(|_| "unset".to_string()),
        None => "unset".to_string(),
    }
}

fn displays(instance: &Value) -> Vec<Display> {
    let configured = instance
        .pointer("/graphics/displays")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty());
    match configured {
        Some(items) => items
            .iter()
            .map(|d| Display {
                width: d["width"].as_u64().unwrap_or(DEFAULT_DISPLAY.width),
                height: d["height"].as_u64().unwrap_or(DEFAULT_DISPLAY.height),
                dpi: d["dpi"].as_u64().unwrap_or(DEFAULT_DISPLAY.dpi),
                refresh_rate_hertz: d["refresh_rate_hertz"]
                    .as_u64()
                    .unwrap_or(DEFAULT_DISPLAY.refresh_rate_hertz),
            })
            .collect(),
        None => vec![DEFAULT_DISPLAY],
    }
}

/// Wire format the launcher expects: per instance one length-delimited
/// field 1 holding, per display, a nested message with width/height/dpi/
/// refresh as varint fields 1..4. Base64 of the whole message.
fn displays_binproto(instances: &[Value]) -> String {
    let mut message = Vec::new();
    for instance in instances {
        let mut per_instance = Vec::new();
        for display in displays(instance) {
            let mut fields = Vec::new();
            put_varint_field(&mut fields, 1, display.width);
            put_varint_field(&mut fields, 2, display.height);
            put_varint_field(&mut fields, 3, display.dpi);
            put_varint_field(&mut fields, 4, display.refresh_rate_hertz);
            put_len_field(&mut per_instance, 1, &fields);
        }
        put_len_field(&mut message, 1, &per_instance);
    }
    base64::engine::general_purpose::STANDARD.encode(message)
}

fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn put_varint_field(out: &mut Vec<u8>, tag: u64, value: u64) {
    put_varint(out, tag << 3);
    put_varint(out, value);
}

fn put_len_field(out: &mut Vec<u8>, tag: u64, payload: &[u8]) {
    put_varint(out, (tag << 3) | 2);
    put_varint(out, payload.len() as u64);
    out.extend_from_slice(payload);
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
