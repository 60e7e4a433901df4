//! `vk_layer_dispatch_table.h`: the dispatch tables layers fill in.

use std::io::{self, Write};

use super::{write_banner, write_sections, FeatureData};

pub(crate) fn write<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    write_banner(out)?;
    writeln!(out)?;
    writeln!(out, "#pragma once")?;
    writeln!(out)?;
    writeln!(
        out,
        "typedef PFN_vkVoidFunction (VKAPI_PTR *PFN_GetPhysicalDeviceProcAddr)(VkInstance instance, const char* pName);"
    )?;

    writeln!(out)?;
    writeln!(out, "// Instance function pointer dispatch table")?;
    writeln!(out, "typedef struct VkLayerInstanceDispatchTable_ {{")?;
    writeln!(out, "    // Manually add in GetPhysicalDeviceProcAddr entry")?;
    writeln!(out, "    PFN_GetPhysicalDeviceProcAddr GetPhysicalDeviceProcAddr;")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_instance_table(),
        |out, _, cmd| writeln!(out, "    PFN_{} {};", cmd.name, cmd.stem()),
    )?;
    writeln!(out, "}} VkLayerInstanceDispatchTable;")?;

    writeln!(out)?;
    writeln!(out, "// Device function pointer dispatch table")?;
    writeln!(out, "#define DEVICE_DISP_TABLE_MAGIC_NUMBER 0x10ADED040410ADEDUL")?;
    writeln!(out, "typedef struct VkLayerDispatchTable_ {{")?;
    writeln!(out, "    uint64_t magic; // Should be DEVICE_DISP_TABLE_MAGIC_NUMBER")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_device_table(),
        |out, _, cmd| writeln!(out, "    PFN_{} {};", cmd.name, cmd.stem()),
    )?;
    writeln!(out, "}} VkLayerDispatchTable;")?;
    writeln!(out)?;
    writeln!(out, "// clang-format on")?;
    Ok(())
}
