#![deny(warnings)]

use std::path::PathBuf;

use vk_loadergen::{
    loader, Artifact, FatalError, FeatureInfo, Generator, GeneratorOptions, LoaderGenerator, NameKind, Pattern,
    Registry, Diagnostics,
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("resources")
        .join("mini_vk.xml")
}

fn fixture() -> Registry {
    let options = GeneratorOptions::loader(Artifact::LoaderHeader.filename());
    match vk_loadergen::parse_file(&fixture_path(), &options) {
        Ok((reg, errors)) => {
            errors.iter().for_each(|e| eprintln!("non-fatal error while parsing registry: {}", e));
            reg
        }
        Err(fatal_error) => panic!("{:?}", fatal_error),
    }
}

fn generate(reg: &mut Registry, artifact: Artifact) -> String {
    let (out, errors) = loader::generate(reg, artifact, Vec::new()).unwrap();
    errors.iter().for_each(|e| eprintln!("non-fatal error while generating: {}", e));
    String::from_utf8(out).unwrap()
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("missing `{}`", needle))
}

/// Text between `start` and the next line that is exactly `end`.
fn block<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = position(text, start);
    let len = text[from..]
        .find(end)
        .unwrap_or_else(|| panic!("`{}` is not closed", start));
    &text[from..from + len]
}

struct Discard;

impl Generator for Discard {
    fn begin_file(&mut self, _reg: &Registry, _options: &GeneratorOptions) -> Result<(), FatalError> {
        Ok(())
    }

    fn end_file(&mut self, _reg: &Registry) -> Result<(), FatalError> {
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
#[test]
fn test_loader_header() {
    let mut reg = fixture();
    let text = generate(&mut reg, Artifact::LoaderHeader);
    assert!(text.starts_with("// *** THIS FILE IS GENERATED - DO NOT EDIT! ***\n"));
    assert!(text.contains("#pragma once\n"));
    assert!(text.contains("extern const VkLayerInstanceDispatchTable instance_disp;\n"));
    assert!(text.contains("extern const char *const LOADER_INSTANCE_EXTENSIONS[];\n"));

    let icd = block(&text, "struct loader_icd_term_dispatch {", "};");
    assert!(icd.contains("    // ---- Core Vulkan 1.0 commands\n"));
    assert!(icd.contains("    PFN_vkEnumeratePhysicalDevices EnumeratePhysicalDevices;\n"));
    assert!(icd.contains("    PFN_vkGetDeviceProcAddr GetDeviceProcAddr;\n"));
    assert!(icd.contains("    PFN_vkGetPhysicalDeviceProperties2KHR GetPhysicalDeviceProperties2KHR;\n"));
    assert!(icd.contains(
        "#if defined(VK_USE_PLATFORM_XLIB_KHR)\n    \
         PFN_vkCreateXlibSurfaceKHR CreateXlibSurfaceKHR;\n\
         #endif // VK_USE_PLATFORM_XLIB_KHR\n"
    ));
    assert!(!icd.contains("CreateInstance;"));
    assert!(!icd.contains("GetInstanceProcAddr;"));
    assert!(!icd.contains("QueueWaitIdle;"));

    let enables = block(&text, "struct loader_instance_extension_enable_list {", "};");
    assert!(enables.contains("    uint8_t khr_get_physical_device_properties2;\n"));
    assert!(enables.contains("    uint8_t ext_debug_utils;\n"));
    assert!(!enables.contains("khr_surface"));

    let terms = block(&text, "struct loader_device_terminator_dispatch {", "};");
    assert!(terms.contains("    // ---- VK_KHR_swapchain extension commands\n"));
    assert!(terms.contains("    PFN_vkCreateSwapchainKHR CreateSwapchainKHR;\n"));
    assert!(terms.contains("    PFN_vkSetDebugUtilsObjectNameEXT SetDebugUtilsObjectNameEXT;\n"));
    assert!(terms.contains("    PFN_vkCmdInsertDebugUtilsLabelEXT CmdInsertDebugUtilsLabelEXT;\n"));
    assert!(!terms.contains("GetDeviceProcAddr"));

    let ext_init = block(
        &text,
        "VKAPI_ATTR void VKAPI_CALL loader_init_device_extension_dispatch_table(",
        "\n\n",
    );
    assert!(ext_init.contains("PFN_vkGetInstanceProcAddr gipa,\n"));
    assert!(ext_init.contains("PFN_vkGetDeviceProcAddr gdpa,\n"));
    assert!(ext_init.contains("VkInstance inst, VkDevice dev);"));

    let core = position(&text, "// Loader core instance terminators");
    assert!(position(&text, "VKAPI_ATTR void VKAPI_CALL terminator_DestroyInstance(") > core);
    assert!(text.contains("VKAPI_ATTR PFN_vkVoidFunction VKAPI_CALL terminator_GetDeviceProcAddr("));
    assert!(!text.contains("terminator_CreateInstance("));
}

#[test]
fn test_layer_dispatch_table() {
    let mut reg = fixture();
    let text = generate(&mut reg, Artifact::LayerDispatchTable);
    assert!(text.contains(
        "typedef PFN_vkVoidFunction (VKAPI_PTR *PFN_GetPhysicalDeviceProcAddr)(VkInstance instance, const char* pName);\n"
    ));

    let instance = block(&text, "typedef struct VkLayerInstanceDispatchTable_ {", "} VkLayerInstanceDispatchTable;");
    assert!(instance.contains("    PFN_GetPhysicalDeviceProcAddr GetPhysicalDeviceProcAddr;\n"));
    assert!(instance.contains("    PFN_vkCreateInstance CreateInstance;\n"));
    assert!(instance.contains("    PFN_vkGetInstanceProcAddr GetInstanceProcAddr;\n"));
    assert!(instance.contains("    // ---- VK_KHR_get_physical_device_properties2 extension commands\n"));
    assert!(!instance.contains("QueueWaitIdle"));

    let device = block(&text, "typedef struct VkLayerDispatchTable_ {", "} VkLayerDispatchTable;");
    assert!(device.contains("    uint64_t magic; // Should be DEVICE_DISP_TABLE_MAGIC_NUMBER\n"));
    assert!(device.contains("    PFN_vkQueueWaitIdle QueueWaitIdle;\n"));
    assert!(device.contains("    PFN_vkCreateSwapchainKHR CreateSwapchainKHR;\n"));
    assert!(text.contains("#define DEVICE_DISP_TABLE_MAGIC_NUMBER 0x10ADED040410ADEDUL\n"));

    // Only supported by vulkansc.
    assert!(!text.contains("GetSafetyCriticalStateNV"));
}

#[test]
fn test_loader_source_tables() {
    let mut reg = fixture();
    let text = generate(&mut reg, Artifact::LoaderSource);

    let init = block(&text, "VKAPI_ATTR bool VKAPI_CALL loader_icd_init_entries(", "    return true;");
    assert!(init.contains("    LOOKUP_REQUIRED_GIPA(EnumeratePhysicalDevices);\n"));
    assert!(init.contains("    LOOKUP_GIPA(GetPhysicalDeviceProperties2);\n"));
    assert!(init.contains("    // ---- Core Vulkan 1.1 commands\n"));

    assert!(text.contains("    table->GetDeviceProcAddr = gpa;\n"));
    assert!(text.contains("    table->GetInstanceProcAddr = gpa;\n"));
    assert!(text.contains("    table->QueueWaitIdle = (PFN_vkQueueWaitIdle)gpa(dev, \"vkQueueWaitIdle\");\n"));
    assert!(text.contains("    table->magic = DEVICE_DISP_TABLE_MAGIC_NUMBER;\n"));

    let ext_init = block(
        &text,
        "VKAPI_ATTR void VKAPI_CALL loader_init_device_extension_dispatch_table(",
        "\n}\n",
    );
    let gipa = position(ext_init, "PFN_vkGetInstanceProcAddr gipa,\n");
    let gdpa = position(ext_init, "PFN_vkGetDeviceProcAddr gdpa,\n");
    let handles = position(ext_init, "VkInstance inst, VkDevice dev) {\n");
    assert!(gipa < gdpa && gdpa < handles);
    assert!(ext_init.contains(
        "    table->CreateSwapchainKHR = (PFN_vkCreateSwapchainKHR)gdpa(dev, \"vkCreateSwapchainKHR\");\n"
    ));
    assert!(ext_init.contains(
        "    table->SetDebugUtilsObjectNameEXT = (PFN_vkSetDebugUtilsObjectNameEXT)gipa(inst, \"vkSetDebugUtilsObjectNameEXT\");\n"
    ));

    let instance_lookup = block(&text, "loader_lookup_instance_dispatch_table(const", "    *found_name = false;\n    return NULL;");
    assert!(instance_lookup.contains("    name += 2;\n"));
    assert!(instance_lookup.contains(
        "    if (!strcmp(name, \"EnumeratePhysicalDevices\")) return (void *)table->EnumeratePhysicalDevices;\n"
    ));
    assert!(!instance_lookup.contains("\"EnumerateInstanceVersion\""));

    let device_lookup = block(&text, "loader_lookup_device_dispatch_table(const", "    *found_name = false;\n    return NULL;");
    assert!(device_lookup.contains(
        "    if (!strcmp(name, \"SetDebugUtilsObjectNameEXT\")) return (void *)SetDebugUtilsObjectNameEXT;\n"
    ));
    assert!(device_lookup.contains("    if (!strcmp(name, \"QueueWaitIdle\")) return (void *)table->QueueWaitIdle;\n"));

    let disp = block(&text, "const VkLayerInstanceDispatchTable instance_disp = {", "};");
    assert!(disp.contains("    .DestroyInstance = terminator_DestroyInstance,\n"));
    assert!(disp.contains("    .GetPhysicalDeviceProperties2KHR = terminator_GetPhysicalDeviceProperties2,\n"));
    assert!(!disp.contains(".CreateInstance"));
    assert!(!disp.contains(".GetInstanceProcAddr"));

    let list = block(&text, "const char *const LOADER_INSTANCE_EXTENSIONS[] = {", "NULL };");
    assert!(list.contains("VK_KHR_SURFACE_EXTENSION_NAME,\n"));
    assert!(list.contains("#if defined(VK_USE_PLATFORM_XLIB_KHR)\n"));
    assert!(!list.contains("VK_KHR_SWAPCHAIN_EXTENSION_NAME"));
}

#[test]
fn test_loader_source_entry_points() {
    let mut reg = fixture();
    let text = generate(&mut reg, Artifact::LoaderSource);

    assert!(text.contains("// ---- VK_EXT_debug_utils extension trampoline/terminators\n"));
    assert!(text.contains("// ---- VK_KHR_device_group extension trampoline/terminators\n"));
    // Hand-written in the loader.
    assert!(!text.contains("// ---- VK_KHR_surface extension trampoline/terminators"));
    assert!(!text.contains("VKAPI_CALL CreateSwapchainKHR("));

    // Aliases get a trampoline but share the core terminator.
    assert!(text.contains("VKAPI_ATTR void VKAPI_CALL GetPhysicalDeviceProperties2KHR("));
    assert!(!text.contains("terminator_GetPhysicalDeviceProperties2KHR("));

    let term = position(
        &text,
        "VKAPI_ATTR VkResult VKAPI_CALL terminator_GetPhysicalDevicePresentRectanglesKHR(",
    );
    let body = &text[term..];
    let unwrap = position(body, "wsi_unwrap_icd_surface(icd_term, &unwrapped_surface)");
    let unwrapped = position(
        body,
        "return icd_term->dispatch.GetPhysicalDevicePresentRectanglesKHR(phys_dev_term->phys_dev, unwrapped_surface, pRectCount, pRects);",
    );
    let fallback = position(
        body,
        "return icd_term->dispatch.GetPhysicalDevicePresentRectanglesKHR(phys_dev_term->phys_dev, surface, pRectCount, pRects);",
    );
    assert!(unwrap < unwrapped && unwrapped < fallback);

    let term = position(&text, "VKAPI_ATTR VkResult VKAPI_CALL terminator_SetDebugUtilsObjectNameEXT(");
    let body = &text[term..];
    let phys = position(body, "pNameInfo->objectType == VK_OBJECT_TYPE_PHYSICAL_DEVICE");
    let surface = position(body, "pNameInfo->objectType == VK_OBJECT_TYPE_SURFACE_KHR");
    let instance = position(body, "pNameInfo->objectType == VK_OBJECT_TYPE_INSTANCE");
    let call = position(
        body,
        "return dev->loader_dispatch.extension_terminator_dispatch.SetDebugUtilsObjectNameEXT(device, &local_pNameInfo);",
    );
    assert!(phys < surface && surface < instance && instance < call);

    let term = position(&text, "VKAPI_ATTR VkResult VKAPI_CALL terminator_GetDeviceGroupSurfacePresentModes2EXT(");
    assert!(text[term..].contains("VkPhysicalDeviceSurfaceInfo2KHR info_copy = *pSurfaceInfo;"));

    assert!(text.contains("ptr_instance->enabled_known_extensions.khr_get_physical_device_properties2 == 1"));
    assert!(text.contains("        *addr = (void *)GetPhysicalDevicePresentRectanglesKHR;\n"));
    assert!(text.contains(
        "        if (0 == strcmp(pCreateInfo->ppEnabledExtensionNames[i], VK_EXT_DEBUG_UTILS_EXTENSION_NAME)) {\n"
    ));
    assert!(text.contains("        return (PFN_vkVoidFunction)terminator_CreateSwapchainKHR;\n"));
    assert!(text.contains(
        "    dispatch->CreateSwapchainKHR = (PFN_vkCreateSwapchainKHR)gpda(dev->icd_device, \"vkCreateSwapchainKHR\");\n"
    ));
    assert!(text.contains("#if defined(VK_USE_PLATFORM_WIN32_KHR)\n"));
}

#[test]
fn test_platform_guard_balance() {
    let mut reg = fixture();
    for artifact in Artifact::ALL.iter() {
        let text = generate(&mut reg, *artifact);
        let mut open = Vec::new();
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("#if defined(") {
                open.push(rest.trim_end_matches(')').to_string());
            } else if let Some(rest) = line.strip_prefix("#endif // ") {
                assert_eq!(open.pop().as_deref(), Some(rest), "{}", artifact.filename());
            }
        }
        assert!(open.is_empty(), "{}: unclosed {:?}", artifact.filename(), open);
    }
}

#[test]
fn test_emission_is_deterministic() {
    let mut reg = fixture();
    for artifact in Artifact::ALL.iter() {
        let first = generate(&mut reg, *artifact);
        let second = generate(&mut reg, *artifact);
        assert_eq!(first, second, "{}", artifact.filename());
    }
    let mut other = fixture();
    assert_eq!(
        generate(&mut reg, Artifact::LoaderSource),
        generate(&mut other, Artifact::LoaderSource)
    );
}

#[test]
fn test_removed_extension_and_reset() {
    let mut reg = fixture();
    let options = GeneratorOptions::loader(Artifact::LoaderSource.filename())
        .remove_extensions(Pattern::new("VK_EXT_debug_utils").unwrap());
    let mut generator = LoaderGenerator::new(Vec::new(), Diagnostics::new("test"));
    reg.api_gen(&options, &mut generator).unwrap();
    let (out, _) = generator.finish();
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("SetDebugUtilsObjectNameEXT"));
    let members: Vec<&str> = reg
        .group_enums("VkStructureType")
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert!(!members.contains(&"VK_STRUCTURE_TYPE_DEBUG_UTILS_LABEL_EXT"));
    assert!(members.contains(&"VK_STRUCTURE_TYPE_SWAPCHAIN_CREATE_INFO_KHR"));

    // A later run selects from scratch.
    let text = generate(&mut reg, Artifact::LoaderSource);
    assert!(text.contains("SetDebugUtilsObjectNameEXT"));
    let members: Vec<&str> = reg
        .group_enums("VkStructureType")
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert!(members.contains(&"VK_STRUCTURE_TYPE_DEBUG_UTILS_LABEL_EXT"));
}

#[test]
fn test_unknown_artifact() {
    let mut reg = fixture();
    let options = GeneratorOptions::loader("vulkan_core.h");
    let mut generator = LoaderGenerator::new(Vec::<u8>::new(), Diagnostics::new("test"));
    match reg.api_gen(&options, &mut generator) {
        Err(FatalError::UnknownArtifact(name)) => assert_eq!(name, "vulkan_core.h"),
        other => panic!("{:?}", other),
    }
}

//--------------------------------------------------------------------------------------------------
#[test]
fn test_alias_idempotence() {
    let reg = fixture();
    for name in reg.commands().keys() {
        let once = reg.resolve(NameKind::Command, name);
        assert_eq!(reg.resolve(NameKind::Command, once), once);
    }
    for name in reg.types().keys() {
        let once = reg.resolve(NameKind::Type, name);
        assert_eq!(reg.resolve(NameKind::Type, once), once);
    }
    for name in reg.enums().keys() {
        let once = reg.resolve(NameKind::Enum, name);
        assert_eq!(reg.resolve(NameKind::Enum, once), once);
    }
    assert_eq!(
        reg.resolve(NameKind::Command, "vkGetPhysicalDeviceProperties2KHR"),
        "vkGetPhysicalDeviceProperties2"
    );
}

#[test]
fn test_alias_shares_signature() {
    let reg = fixture();
    let alias = reg.command_definition("vkGetPhysicalDeviceProperties2KHR").unwrap();
    let target = reg.command_definition("vkGetPhysicalDeviceProperties2").unwrap();
    assert_eq!(alias.params, target.params);
    assert_eq!(alias.proto.name, "vkGetPhysicalDeviceProperties2KHR");
    assert_eq!(
        reg.alias_of(NameKind::Command, "vkGetPhysicalDeviceProperties2KHR"),
        Some("vkGetPhysicalDeviceProperties2")
    );
}

#[test]
fn test_requirement_closure_and_group_integrity() {
    let mut reg = fixture();
    reg.api_gen(&GeneratorOptions::loader(Artifact::LoaderHeader.filename()), &mut Discard)
        .unwrap();

    for (name, cmd) in reg.commands().iter().filter(|(_, c)| c.required) {
        let def = reg.command_definition(name).unwrap();
        for ty in def.type_refs() {
            let info = reg.type_info(reg.resolve(NameKind::Type, ty)).unwrap();
            assert!(info.required, "{} needs {}", cmd.name, ty);
        }
    }
    for info in reg.types().values().filter(|t| t.required) {
        for target in info.requires.iter().chain(info.alias.iter()) {
            if let Some(target) = reg.type_info(target) {
                assert!(target.required, "{} needs {}", info.name, target.name);
            }
        }
    }
    assert!(reg.type_info("VkPhysicalDeviceSurfaceInfo2KHR").unwrap().required);
    assert!(!reg.command("vkGetSafetyCriticalStateNV").unwrap().required);

    for name in reg.groups().keys() {
        for info in reg.group_enums(name) {
            assert!(info.required, "{} in {}", info.name, name);
        }
    }
}

#[test]
fn test_deprecation_carry_through() {
    let mut reg = fixture();
    reg.api_gen(&GeneratorOptions::loader(Artifact::LoaderHeader.filename()), &mut Discard)
        .unwrap();

    let by_version = &reg.type_info("VkPhysicalDeviceProperties").unwrap().deprecation;
    assert_eq!(by_version.by_version.as_deref(), Some("VK_VERSION_1_1"));
    assert!(by_version.by_extensions.is_empty());
    assert_eq!(by_version.link.as_deref(), Some("deprecation-gpdp2"));

    let by_extension = &reg.command("vkGetPhysicalDeviceProperties").unwrap().deprecation;
    assert_eq!(by_extension.by_version, None);
    assert_eq!(by_extension.by_extensions, vec!["VK_KHR_get_physical_device_properties2"]);
}

#[test]
fn test_feature_order() {
    let mut reg = fixture();
    reg.api_gen(&GeneratorOptions::loader(Artifact::LoaderHeader.filename()), &mut Discard)
        .unwrap();
    let names: Vec<&str> = reg
        .selected_features()
        .iter()
        .map(|f: &&FeatureInfo| f.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "VK_VERSION_1_0",
            "VK_VERSION_1_1",
            "VK_KHR_surface",
            "VK_KHR_swapchain",
            "VK_KHR_xlib_surface",
            "VK_KHR_get_physical_device_properties2",
            "VK_KHR_device_group",
            "VK_EXT_debug_utils",
            "VK_EXT_full_screen_exclusive",
        ]
    );
}

//--------------------------------------------------------------------------------------------------
#[test]
fn test_strip_keeps_matching_variant() {
    let doc = r#"<registry>
        <types>
            <type name="float"/>
            <type category="struct" name="Vec3" api="graphics"><member><type>float</type> <name>x</name></member></type>
            <type category="struct" name="Vec3" api="compute"><member><type>float</type> <name>y</name></member></type>
        </types>
    </registry>"#;
    let (reg, _) = vk_loadergen::parse_stream(doc.as_bytes(), &GeneratorOptions::new("out.h", "graphics")).unwrap();
    let vec3 = reg.type_info("Vec3").unwrap();
    assert_eq!(vec3.api, vec!["graphics"]);
    assert_eq!(vec3.members[0].name, "x");
}

#[test]
fn test_merge_keeps_require_for_merged_api() {
    let doc = r#"<registry>
        <types>
            <type name="void"/>
        </types>
        <commands>
            <command><proto><type>void</type> <name>vkShared</name></proto></command>
            <command><proto><type>void</type> <name>vkFromVulkan</name></proto></command>
        </commands>
        <feature api="vulkan,vulkansc" name="VK_VERSION_1_0" number="1.0">
            <require><command name="vkShared"/></require>
            <require api="vulkan"><command name="vkFromVulkan"/></require>
        </feature>
    </registry>"#;
    let options = GeneratorOptions::new("out.h", "vulkansc").merge_api_names(&["vulkan"]);
    let (mut reg, errors) = vk_loadergen::parse_stream(doc.as_bytes(), &options).unwrap();
    assert!(errors.is_empty(), "{:?}", errors);
    let errors = reg.api_gen(&options, &mut Discard).unwrap();
    assert!(errors.is_empty(), "{:?}", errors);
    assert!(reg.command("vkShared").unwrap().required);
    assert!(reg.command("vkFromVulkan").unwrap().required);
}

#[test]
fn test_merge_without_matching_variant() {
    let doc = r#"<registry>
        <types>
            <type name="float"/>
            <type category="struct" name="Vec3" api="xr"><member><type>float</type> <name>x</name></member></type>
        </types>
    </registry>"#;
    let options = GeneratorOptions::new("out.h", "vulkansc").merge_api_names(&["vulkan"]);
    match vk_loadergen::parse_stream(doc.as_bytes(), &options) {
        Err(FatalError::NoMatchingVariant { name, .. }) => assert_eq!(name, "Vec3"),
        other => panic!("{:?}", other.map(|(_, errors)| errors)),
    }
}

#[test]
fn test_extension_enum_in_group() {
    let doc = r#"<registry>
        <types>
            <type category="enum" name="VkErr"/>
        </types>
        <enums name="VkErr" type="enum">
            <enum value="0" name="VK_ERR_NONE"/>
            <enum value="-1" name="VK_ERR_FIRST"/>
        </enums>
        <feature api="vulkan" name="VK_VERSION_1_0" number="1.0">
            <require><type name="VkErr"/></require>
        </feature>
        <extensions>
            <extension name="VK_EXT_sample" number="17" type="device" supported="vulkan">
                <require><enum offset="3" dir="-" extends="VkErr" name="VK_ERR_SAMPLE"/></require>
            </extension>
        </extensions>
    </registry>"#;
    let options = GeneratorOptions::new("out.h", "vulkan");
    let (mut reg, _) = vk_loadergen::parse_stream(doc.as_bytes(), &options).unwrap();
    assert_eq!(reg.enum_type("VK_ERR_SAMPLE"), Some("VkErr"));
    assert_eq!(
        reg.enum_info("VK_ERR_SAMPLE").unwrap().value.numeric_value(),
        Some(-1_000_016_003)
    );

    reg.api_gen(&options, &mut Discard).unwrap();
    let members: Vec<&str> = reg.group_enums("VkErr").iter().map(|e| e.name.as_str()).collect();
    assert_eq!(members, vec!["VK_ERR_NONE", "VK_ERR_FIRST", "VK_ERR_SAMPLE"]);

    let options = options.remove_extensions(Pattern::new("VK_EXT_sample").unwrap());
    reg.api_gen(&options, &mut Discard).unwrap();
    let members: Vec<&str> = reg.group_enums("VkErr").iter().map(|e| e.name.as_str()).collect();
    assert_eq!(members, vec!["VK_ERR_NONE", "VK_ERR_FIRST"]);
}
