//! `vk_loader_extensions.c`: dispatch table setup, name lookup, and the
//! generated extension entry points.

use std::io::{self, Write};

use super::tramp::{has_terminator, has_trampoline, write_terminator, write_trampoline};
use super::{names, write_banner, write_guarded, write_sections, CommandData, FeatureData};

pub(crate) fn write<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    write_banner(out)?;
    writeln!(out)?;
    for include in &[
        "<stdio.h>",
        "<stdlib.h>",
        "<string.h>",
        "\"vk_loader_platform.h\"",
        "\"loader.h\"",
        "\"vk_loader_extensions.h\"",
        "<vulkan/vk_icd.h>",
        "\"wsi.h\"",
        "\"debug_utils.h\"",
        "\"extension_manual.h\"",
    ] {
        writeln!(out, "#include {}", include)?;
    }
    write_dev_ext_error(out)?;
    write_icd_init_entries(out, features)?;
    write_device_dispatch_init(out, features)?;
    write_instance_dispatch_init(out, features)?;
    write_device_lookup(out, features)?;
    write_instance_lookup(out, features)?;
    write_entry_points(out, features)?;
    write_instance_gpa(out, features)?;
    write_create_instance(out, features)?;
    write_device_terminator_lookup(out, features)?;
    write_instance_disp(out, features)?;
    write_instance_extension_list(out, features)?;
    writeln!(out)?;
    writeln!(out, "// clang-format on")?;
    Ok(())
}

fn is_first_version(feature: &FeatureData) -> bool {
    feature.version.as_deref() == Some("1.0")
}

fn write_dev_ext_error<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// Device extension error function")?;
    writeln!(out, "VKAPI_ATTR VkResult VKAPI_CALL vkDevExtError(VkDevice dev) {{")?;
    writeln!(out, "    struct loader_device *found_dev;")?;
    writeln!(out, "    // The device going in is a trampoline device")?;
    writeln!(out, "    struct loader_icd_term *icd_term = loader_get_icd_and_device(dev, &found_dev);")?;
    writeln!(out)?;
    writeln!(out, "    if (icd_term)")?;
    writeln!(out, "        loader_log(icd_term->this_instance, VULKAN_LOADER_ERROR_BIT, 0,")?;
    writeln!(out, "                   \"Bad destination in loader trampoline dispatch,\"")?;
    writeln!(out, "                   \"Are layers and extensions that you are calling enabled?\");")?;
    writeln!(out, "    return VK_ERROR_EXTENSION_NOT_PRESENT;")?;
    writeln!(out, "}}")
}

fn write_icd_init_entries<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "VKAPI_ATTR bool VKAPI_CALL loader_icd_init_entries(struct loader_instance* inst, struct loader_icd_term *icd_term,")?;
    writeln!(out, "                                                   const PFN_vkGetInstanceProcAddr fp_gipa) {{")?;
    writeln!(out)?;
    writeln!(
        out,
        "#define LOOKUP_GIPA(func) icd_term->dispatch.func = (PFN_vk##func)fp_gipa(icd_term->instance, \"vk\" #func);"
    )?;
    writeln!(out)?;
    writeln!(out, "#define LOOKUP_REQUIRED_GIPA(func)                                                      \\")?;
    writeln!(out, "    do {{                                                                                \\")?;
    writeln!(out, "        LOOKUP_GIPA(func);                                                              \\")?;
    writeln!(out, "        if (!icd_term->dispatch.func) {{                                                 \\")?;
    writeln!(out, "            loader_log(inst, VULKAN_LOADER_WARN_BIT, 0, \"Unable to load %s from ICD %s\",\\")?;
    writeln!(out, "                       \"vk\"#func, icd_term->scanned_icd->lib_name);                     \\")?;
    writeln!(out, "            return false;                                                               \\")?;
    writeln!(out, "        }}                                                                               \\")?;
    writeln!(out, "    }} while (0)")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_icd_dispatch(),
        |out, feature, cmd| {
            if is_first_version(feature) {
                writeln!(out, "    LOOKUP_REQUIRED_GIPA({});", cmd.stem())
            } else {
                writeln!(out, "    LOOKUP_GIPA({});", cmd.stem())
            }
        },
    )?;
    writeln!(out)?;
    writeln!(out, "#undef LOOKUP_REQUIRED_GIPA")?;
    writeln!(out, "#undef LOOKUP_GIPA")?;
    writeln!(out)?;
    writeln!(out, "    return true;")?;
    writeln!(out, "}};")
}

fn write_table_entry<W: Write>(out: &mut W, cmd: &CommandData, getter: &str, handle: &str) -> io::Result<()> {
    writeln!(
        out,
        "    table->{} = (PFN_{}){}({}, \"{}\");",
        cmd.stem(),
        cmd.name,
        getter,
        handle,
        cmd.name
    )
}

fn write_device_dispatch_init<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// Init Device function pointer dispatch table with core commands")?;
    writeln!(out, "VKAPI_ATTR void VKAPI_CALL loader_init_device_dispatch_table(struct loader_dev_dispatch_table *dev_table, PFN_vkGetDeviceProcAddr gpa,")?;
    writeln!(out, "                                                             VkDevice dev) {{")?;
    writeln!(out, "    VkLayerDispatchTable *table = &dev_table->core_dispatch;")?;
    writeln!(out, "    if (table->magic != DEVICE_DISP_TABLE_MAGIC_NUMBER) {{ abort(); }}")?;
    writeln!(out, "    for (uint32_t i = 0; i < MAX_NUM_UNKNOWN_EXTS; i++) dev_table->ext_dispatch[i] = (PFN_vkDevExt)vkDevExtError;")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |feature, cmd| feature.is_core() && cmd.in_device_table(),
        |out, _, cmd| {
            if cmd.name == "vkGetDeviceProcAddr" {
                writeln!(out, "    table->GetDeviceProcAddr = gpa;")
            } else {
                write_table_entry(out, cmd, "gpa", "dev")
            }
        },
    )?;
    writeln!(out, "}}")?;

    writeln!(out)?;
    writeln!(out, "// Init Device function pointer dispatch table with extension commands")?;
    writeln!(out, "VKAPI_ATTR void VKAPI_CALL loader_init_device_extension_dispatch_table(struct loader_dev_dispatch_table *dev_table,")?;
    writeln!(out, "                                                                       PFN_vkGetInstanceProcAddr gipa,")?;
    writeln!(out, "                                                                       PFN_vkGetDeviceProcAddr gdpa,")?;
    writeln!(out, "                                                                       VkInstance inst, VkDevice dev) {{")?;
    writeln!(out, "    VkLayerDispatchTable *table = &dev_table->core_dispatch;")?;
    writeln!(out, "    table->magic = DEVICE_DISP_TABLE_MAGIC_NUMBER;")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |feature, cmd| !feature.is_core() && cmd.in_device_table(),
        |out, feature, cmd| {
            // Device commands of instance extensions resolve through the instance.
            if feature.is_instance_extension() {
                write_table_entry(out, cmd, "gipa", "inst")
            } else {
                write_table_entry(out, cmd, "gdpa", "dev")
            }
        },
    )?;
    writeln!(out, "}}")
}

fn write_instance_dispatch_init<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    let tables = [
        ("core", "Instance function pointer dispatch table with core commands"),
        ("extension", "Instance function pointer dispatch table with extension commands"),
    ];
    for (i, (kind, what)) in tables.iter().enumerate() {
        let want_core = i == 0;
        writeln!(out)?;
        writeln!(out, "// Init {}", what)?;
        writeln!(
            out,
            "VKAPI_ATTR void VKAPI_CALL loader_init_instance_{}_dispatch_table(VkLayerInstanceDispatchTable *table, PFN_vkGetInstanceProcAddr gpa,",
            kind
        )?;
        writeln!(out, "                                                                    VkInstance inst) {{")?;
        write_sections(
            out,
            features,
            "    ",
            "commands",
            |feature, cmd| {
                feature.is_core() == want_core
                    && cmd.in_instance_table()
                    && !names::contains(names::ADD_INST_CMDS, &cmd.name)
            },
            |out, _, cmd| {
                if cmd.name == "vkGetInstanceProcAddr" {
                    writeln!(out, "    table->GetInstanceProcAddr = gpa;")
                } else {
                    write_table_entry(out, cmd, "gpa", "inst")
                }
            },
        )?;
        writeln!(out, "}}")?;
    }
    Ok(())
}

fn write_lookup_prologue<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "    if (!name || name[0] != 'v' || name[1] != 'k') {{")?;
    writeln!(out, "        *found_name = false;")?;
    writeln!(out, "        return NULL;")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    *found_name = true;")?;
    writeln!(out, "    name += 2;")
}

fn write_lookup_epilogue<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "    *found_name = false;")?;
    writeln!(out, "    return NULL;")?;
    writeln!(out, "}}")
}

fn write_device_lookup<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// Device command lookup function")?;
    writeln!(out, "VKAPI_ATTR void* VKAPI_CALL loader_lookup_device_dispatch_table(const VkLayerDispatchTable *table, const char *name, bool* found_name) {{")?;
    write_lookup_prologue(out)?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_device_table(),
        |out, feature, cmd| {
            if names::contains(names::DEVICE_CMDS_MUST_USE_TRAMP, &cmd.name) && has_trampoline(feature, cmd) {
                writeln!(out, "    if (!strcmp(name, \"{}\")) return (void *){};", cmd.stem(), cmd.stem())
            } else {
                writeln!(out, "    if (!strcmp(name, \"{}\")) return (void *)table->{};", cmd.stem(), cmd.stem())
            }
        },
    )?;
    write_lookup_epilogue(out)
}

fn write_instance_lookup<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// Instance command lookup function")?;
    writeln!(out, "VKAPI_ATTR void* VKAPI_CALL loader_lookup_instance_dispatch_table(const VkLayerInstanceDispatchTable *table, const char *name,")?;
    writeln!(out, "                                                                 bool *found_name) {{")?;
    write_lookup_prologue(out)?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_instance_table() && !names::contains(names::PRE_INSTANCE_FUNCTIONS, &cmd.name),
        |out, _, cmd| writeln!(out, "    if (!strcmp(name, \"{}\")) return (void *)table->{};", cmd.stem(), cmd.stem()),
    )?;
    write_lookup_epilogue(out)
}

fn write_entry_points<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    write_sections(
        out,
        features,
        "",
        "trampoline/terminators",
        |feature, cmd| has_trampoline(feature, cmd),
        |out, feature, cmd| {
            write_trampoline(out, feature, cmd)?;
            if has_terminator(feature, cmd) {
                write_terminator(out, feature, cmd)?;
            }
            Ok(())
        },
    )
}

fn write_instance_gpa<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// GPA helpers for extensions")?;
    writeln!(out, "bool extension_instance_gpa(struct loader_instance *ptr_instance, const char *name, void **addr) {{")?;
    writeln!(out, "    *addr = NULL;")?;
    write_sections(
        out,
        features,
        "    ",
        "extension commands",
        |feature, cmd| has_trampoline(feature, cmd),
        |out, feature, cmd| {
            writeln!(out, "    if (!strcmp(\"{}\", name)) {{", cmd.name)?;
            if feature.has_enable_flag() {
                writeln!(
                    out,
                    "        *addr = (ptr_instance->enabled_known_extensions.{} == 1)",
                    names::enable_flag(&feature.name)
                )?;
                writeln!(out, "                     ? (void *){}", cmd.stem())?;
                writeln!(out, "                     : NULL;")?;
            } else {
                writeln!(out, "        *addr = (void *){};", cmd.stem())?;
            }
            writeln!(out, "        return true;")?;
            writeln!(out, "    }}")
        },
    )?;
    writeln!(out, "    return false;")?;
    writeln!(out, "}}")
}

fn write_create_instance<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// A function that can be used to query enabled extensions during a vkCreateInstance call")?;
    writeln!(out, "void extensions_create_instance(struct loader_instance *ptr_instance, const VkInstanceCreateInfo *pCreateInfo) {{")?;
    writeln!(out, "    for (uint32_t i = 0; i < pCreateInfo->enabledExtensionCount; i++) {{")?;
    for feature in features.iter().filter(|f| f.has_enable_flag()) {
        writeln!(out)?;
        writeln!(out, "    // ---- {}", feature.title())?;
        write_guarded(out, feature.protect.as_deref(), |out| {
            writeln!(
                out,
                "        if (0 == strcmp(pCreateInfo->ppEnabledExtensionNames[i], {})) {{",
                feature.name_literal()
            )?;
            writeln!(
                out,
                "            ptr_instance->enabled_known_extensions.{} = 1;",
                names::enable_flag(&feature.name)
            )?;
            writeln!(out, "        }}")
        })?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "}}")
}

fn write_device_terminator_lookup<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// Some device commands still need a terminator because the loader needs to unwrap something about them.")?;
    writeln!(out, "// In many cases, the item needing unwrapping is a VkPhysicalDevice or VkSurfaceKHR object.")?;
    writeln!(out, "PFN_vkVoidFunction get_extension_device_proc_terminator(struct loader_device *dev, const char *name, bool* found_name) {{")?;
    writeln!(out, "    *found_name = false;")?;
    writeln!(out, "    if (!name || name[0] != 'v' || name[1] != 'k') {{")?;
    writeln!(out, "        return NULL;")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    name += 2;")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_device_terminator_dispatch(),
        |out, _, cmd| {
            writeln!(out, "    if (!strcmp(name, \"{}\")) {{", cmd.stem())?;
            writeln!(out, "        *found_name = true;")?;
            writeln!(out, "        return (PFN_vkVoidFunction)terminator_{};", cmd.canonical_stem())?;
            writeln!(out, "    }}")
        },
    )?;
    writeln!(out, "    return NULL;")?;
    writeln!(out, "}}")?;

    writeln!(out)?;
    writeln!(out, "void init_extension_device_proc_terminator_dispatch(struct loader_device *dev) {{")?;
    writeln!(out, "    struct loader_device_terminator_dispatch* dispatch = &dev->loader_dispatch.extension_terminator_dispatch;")?;
    writeln!(out, "    PFN_vkGetDeviceProcAddr gpda = (PFN_vkGetDeviceProcAddr)dev->phys_dev_term->this_icd_term->dispatch.GetDeviceProcAddr;")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_device_terminator_dispatch(),
        |out, _, cmd| {
            writeln!(
                out,
                "    dispatch->{} = (PFN_{})gpda(dev->icd_device, \"{}\");",
                cmd.stem(),
                cmd.name,
                cmd.name
            )
        },
    )?;
    writeln!(out, "}}")
}

fn write_instance_disp<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// Instance function pointer dispatch table")?;
    writeln!(out, "const VkLayerInstanceDispatchTable instance_disp = {{")?;
    write_sections(
        out,
        features,
        "    ",
        "commands",
        |_, cmd| cmd.in_instance_disp(),
        |out, _, cmd| writeln!(out, "    .{} = terminator_{},", cmd.stem(), cmd.canonical_stem()),
    )?;
    writeln!(out, "}};")
}

fn write_instance_extension_list<W: Write>(out: &mut W, features: &[FeatureData]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "// A null-terminated list of all of the instance extensions supported by the loader.")?;
    writeln!(out, "// If an instance extension name is not in this list, but it is exported by one or more of the")?;
    writeln!(out, "// ICDs detected by the loader, then the extension name not in the list will be filtered out")?;
    writeln!(out, "// before passing the list of extensions to the application.")?;
    writeln!(out, "const char *const LOADER_INSTANCE_EXTENSIONS[] = {{")?;
    for feature in features.iter().filter(|f| f.is_instance_extension()) {
        write_guarded(out, feature.protect.as_deref(), |out| {
            writeln!(out, "                                                  {},", feature.name_literal())
        })?;
    }
    writeln!(out, "                                                  NULL }};")
}
