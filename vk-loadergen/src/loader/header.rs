//! `vk_loader_extensions.h`: prototypes shared by the loader sources and the
//! dispatch structures it keeps per driver and device.

use std::io::{self, Write};

use super::{names, write_banner, write_guarded, write_sections, FeatureData};

pub(crate) fn write<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    write_banner(out)?;
    writeln!(out)?;
    writeln!(out, "#pragma once")?;
    writeln!(out)?;
    writeln!(out, "#include <stdbool.h>")?;
    writeln!(out, "#include <vulkan/vulkan.h>")?;
    writeln!(out, "#include <vulkan/vk_layer.h>")?;
    writeln!(out, "#include \"vk_layer_dispatch_table.h\"")?;
    writeln!(out)?;
    write_prototypes(out)?;
    write_core_terminators(out, features)?;

    writeln!(out)?;
    writeln!(out, "// ICD function pointer dispatch table")?;
    writeln!(out, "struct loader_icd_term_dispatch {{")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_icd_dispatch(),
        |out, _, cmd| writeln!(out, "    PFN_{} {};", cmd.name, cmd.stem()),
    )?;
    writeln!(out, "}};")?;

    writeln!(out)?;
    writeln!(out, "struct loader_instance_extension_enable_list {{")?;
    for feature in features.iter().filter(|f| f.has_enable_flag()) {
        write_guarded(out, feature.protect.as_deref(), |out| {
            writeln!(out, "    uint8_t {};", names::enable_flag(&feature.name))
        })?;
    }
    writeln!(out, "}};")?;

    writeln!(out)?;
    writeln!(out, "// Functions that required a terminator need to have a separate dispatch table which contains their corresponding")?;
    writeln!(out, "// device function. This is used in the terminators themselves.")?;
    writeln!(out, "struct loader_device_terminator_dispatch {{")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_device_terminator_dispatch(),
        |out, _, cmd| writeln!(out, "    PFN_{} {};", cmd.name, cmd.stem()),
    )?;
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(out, "// clang-format on")?;
    Ok(())
}

fn write_prototypes<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "// Extension interception for vkGetInstanceProcAddr function, so we can return")?;
    writeln!(out, "// the appropriate information for any instance extensions we know about.")?;
    writeln!(out, "bool extension_instance_gpa(struct loader_instance *ptr_instance, const char *name, void **addr);")?;
    writeln!(out)?;
    writeln!(out, "// Extension interception for vkCreateInstance function, so we can properly")?;
    writeln!(out, "// detect and enable any instance extension information for extensions we know")?;
    writeln!(out, "// about.")?;
    writeln!(out, "void extensions_create_instance(struct loader_instance *ptr_instance, const VkInstanceCreateInfo *pCreateInfo);")?;
    writeln!(out)?;
    writeln!(out, "// Extension interception for vkGetDeviceProcAddr function, so we can return")?;
    writeln!(out, "// an appropriate terminator if this is one of those few device commands requiring")?;
    writeln!(out, "// a terminator.")?;
    writeln!(out, "PFN_vkVoidFunction get_extension_device_proc_terminator(struct loader_device *dev, const char *name, bool* found_name);")?;
    writeln!(out)?;
    writeln!(out, "// Fills in the device terminator dispatch table from the driver.")?;
    writeln!(out, "void init_extension_device_proc_terminator_dispatch(struct loader_device *dev);")?;
    writeln!(out)?;
    writeln!(out, "// Dispatch table properly filled in with appropriate terminators for the")?;
    writeln!(out, "// supported extensions.")?;
    writeln!(out, "extern const VkLayerInstanceDispatchTable instance_disp;")?;
    writeln!(out)?;
    writeln!(out, "// Array of extension strings for instance extensions we support.")?;
    writeln!(out, "extern const char *const LOADER_INSTANCE_EXTENSIONS[];")?;
    writeln!(out)?;
    writeln!(out, "VKAPI_ATTR bool VKAPI_CALL loader_icd_init_entries(struct loader_instance* inst, struct loader_icd_term *icd_term,")?;
    writeln!(out, "                                                   const PFN_vkGetInstanceProcAddr fp_gipa);")?;
    writeln!(out)?;
    writeln!(out, "// Init Device function pointer dispatch table with core commands")?;
    writeln!(out, "VKAPI_ATTR void VKAPI_CALL loader_init_device_dispatch_table(struct loader_dev_dispatch_table *dev_table, PFN_vkGetDeviceProcAddr gpa,")?;
    writeln!(out, "                                                             VkDevice dev);")?;
    writeln!(out)?;
    writeln!(out, "// Init Device function pointer dispatch table with extension commands")?;
    writeln!(out, "VKAPI_ATTR void VKAPI_CALL loader_init_device_extension_dispatch_table(struct loader_dev_dispatch_table *dev_table,")?;
    writeln!(out, "                                                                       PFN_vkGetInstanceProcAddr gipa,")?;
    writeln!(out, "                                                                       PFN_vkGetDeviceProcAddr gdpa,")?;
    writeln!(out, "                                                                       VkInstance inst, VkDevice dev);")?;
    writeln!(out)?;
    writeln!(out, "// Init Instance function pointer dispatch table with core commands")?;
    writeln!(out, "VKAPI_ATTR void VKAPI_CALL loader_init_instance_core_dispatch_table(VkLayerInstanceDispatchTable *table, PFN_vkGetInstanceProcAddr gpa,")?;
    writeln!(out, "                                                                    VkInstance inst);")?;
    writeln!(out)?;
    writeln!(out, "// Init Instance function pointer dispatch table with extension commands")?;
    writeln!(out, "VKAPI_ATTR void VKAPI_CALL loader_init_instance_extension_dispatch_table(VkLayerInstanceDispatchTable *table, PFN_vkGetInstanceProcAddr gpa,")?;
    writeln!(out, "                                                                         VkInstance inst);")?;
    writeln!(out)?;
    writeln!(out, "// Device command lookup function")?;
    writeln!(out, "VKAPI_ATTR void* VKAPI_CALL loader_lookup_device_dispatch_table(const VkLayerDispatchTable *table, const char *name, bool* found_name);")?;
    writeln!(out)?;
    writeln!(out, "// Instance command lookup function")?;
    writeln!(out, "VKAPI_ATTR void* VKAPI_CALL loader_lookup_instance_dispatch_table(const VkLayerInstanceDispatchTable *table, const char *name,")?;
    writeln!(out, "                                                                 bool *found_name);")?;
    Ok(())
}

/// Prototypes of the hand-written terminators of core commands.
fn write_core_terminators<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// Loader core instance terminators")?;
    let core = features.iter().filter(|f| f.is_core()).flat_map(|f| f.commands.iter());
    for cmd in core {
        let wanted = cmd.needs_terminator()
            && !cmd.is_alias()
            && !names::contains(names::ADD_INST_CMDS, &cmd.name)
            && cmd.name != "vkGetInstanceProcAddr";
        if wanted {
            write_guarded(out, cmd.protect.as_deref(), |out| {
                writeln!(out, "{};", cmd.cdecl(&format!("terminator_{}", cmd.stem())))
            })?;
        }
    }
    Ok(())
}
