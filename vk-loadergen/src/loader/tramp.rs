//! Trampoline and terminator bodies of extension commands.
//!
//! A trampoline is the entry point the application calls; it finds the
//! dispatch table of the handle and calls down the layer chain. A
//! terminator sits below the last layer and forwards to the driver, first
//! replacing loader-owned handles with the driver's own.

use std::io::{self, Write};

use super::{names, CommandData, FeatureData};
use crate::types::CommandLevel;

const INTENTIONAL_ABORT: &str = "abort(); /* Intentionally fail so user can correct issue. */";

pub(crate) fn has_trampoline(feature: &FeatureData, cmd: &CommandData) -> bool {
    feature.has_generated_entry_points()
        && !names::contains(names::AVOID_CMD_NAMES, &cmd.name)
        && cmd.level != CommandLevel::Global
}

pub(crate) fn has_terminator(feature: &FeatureData, cmd: &CommandData) -> bool {
    has_trampoline(feature, cmd) && cmd.needs_terminator() && !cmd.is_alias()
}

/// Writes `return <call>;`, or `<call>;` for `void` commands followed by
/// `return;` when `early` is set.
fn write_call<W: Write>(out: &mut W, indent: &str, cmd: &CommandData, call: &str, early: bool) -> io::Result<()> {
    if cmd.returns_void() {
        writeln!(out, "{}{};", indent, call)?;
        if early {
            writeln!(out, "{}return;", indent)?;
        }
        Ok(())
    } else {
        writeln!(out, "{}return {};", indent, call)
    }
}

fn write_invalid_handle<W: Write>(out: &mut W, var: &str, cmd: &CommandData) -> io::Result<()> {
    let p = cmd.first_param();
    writeln!(out, "    if (NULL == {}) {{", var)?;
    writeln!(
        out,
        "        loader_log(NULL, VULKAN_LOADER_FATAL_ERROR_BIT | VULKAN_LOADER_VALIDATION_ERROR_BIT, 0,"
    )?;
    writeln!(out, "                   \"{}: Invalid {} \"", cmd.name, p)?;
    writeln!(out, "                   \"[VUID-{}-{}-parameter]\");", cmd.name, p)?;
    writeln!(out, "        {}", INTENTIONAL_ABORT)?;
    writeln!(out, "    }}")
}

/// The info structure of a debug naming or tagging command.
struct DebugObject<'a> {
    param: &'a str,
    type_name: &'a str,
    field: &'static str,
    prefix: &'static str,
    suffix: &'static str,
}

impl<'a> DebugObject<'a> {
    fn of(cmd: &'a CommandData) -> Option<DebugObject<'a>> {
        if !names::is_debug_object_cmd(&cmd.name) {
            return None;
        }
        let info = cmd.params.get(1)?;
        let (field, prefix, suffix) = if cmd.name.contains("DebugMarker") {
            ("object", "VK_DEBUG_REPORT_OBJECT_TYPE_", "_EXT")
        } else {
            ("objectHandle", "VK_OBJECT_TYPE_", "")
        };
        Some(DebugObject {
            param: &info.name,
            type_name: &info.type_name,
            field,
            prefix,
            suffix,
        })
    }

    fn object_type(&self, object: &str) -> String {
        format!("{}{}{}", self.prefix, object, self.suffix)
    }

    fn local(&self) -> String {
        format!("local_{}", self.param)
    }

    fn write_copy<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "    {} {};", self.type_name, self.local())?;
        writeln!(out, "    memcpy(&{}, {}, sizeof({}));", self.local(), self.param, self.type_name)
    }
}

//--------------------------------------------------------------------------------------------------
pub(crate) fn write_trampoline<W: Write>(out: &mut W, feature: &FeatureData, cmd: &CommandData) -> io::Result<()> {
    let p = cmd.first_param();
    let mut args = cmd.arg_names();
    writeln!(out)?;
    writeln!(out, "{} {{", cmd.cdecl(cmd.stem()))?;
    let table = match cmd.handle.as_str() {
        "VkInstance" => {
            writeln!(out, "    struct loader_instance *inst = loader_get_instance({});", p)?;
            write_invalid_handle(out, "inst", cmd)?;
            "inst->disp->layer_inst_disp."
        }
        "VkPhysicalDevice" => {
            writeln!(
                out,
                "    const VkLayerInstanceDispatchTable *disp = loader_get_instance_layer_dispatch({});",
                p
            )?;
            write_invalid_handle(out, "disp", cmd)?;
            "disp->"
        }
        _ => {
            writeln!(out, "    const VkLayerDispatchTable *disp = loader_get_dispatch({});", p)?;
            write_invalid_handle(out, "disp", cmd)?;
            "disp->"
        }
    };
    if cmd.handle == "VkPhysicalDevice" {
        writeln!(
            out,
            "    VkPhysicalDevice unwrapped_phys_dev = loader_unwrap_physical_device({});",
            p
        )?;
        args[0] = String::from("unwrapped_phys_dev");
    }
    if let Some(debug) = DebugObject::of(cmd) {
        debug.write_copy(out)?;
        writeln!(
            out,
            "    if ({}->objectType == {}) {{",
            debug.param,
            debug.object_type("PHYSICAL_DEVICE")
        )?;
        writeln!(
            out,
            "        struct loader_physical_device_tramp *phys_dev_tramp = (struct loader_physical_device_tramp *)(uintptr_t){}->{};",
            debug.param, debug.field
        )?;
        writeln!(
            out,
            "        {}.{} = (uint64_t)(uintptr_t)phys_dev_tramp->phys_dev;",
            debug.local(),
            debug.field
        )?;
        writeln!(out, "    }}")?;
        args[1] = format!("&{}", debug.local());
    }

    let call = format!("{}{}({})", table, cmd.stem(), args.join(", "));
    let null_check = names::contains(names::NULL_CHECK_EXT_NAMES, &feature.name)
        && (cmd.returns_void() || cmd.returns_result());
    if null_check {
        writeln!(out, "    if ({}{} != NULL) {{", table, cmd.stem())?;
        write_call(out, "        ", cmd, &call, false)?;
        if cmd.returns_result() {
            writeln!(out, "    }} else {{")?;
            writeln!(out, "        return VK_SUCCESS;")?;
        }
        writeln!(out, "    }}")?;
    } else {
        write_call(out, "    ", cmd, &call, false)?;
    }
    writeln!(out, "}}")
}

//--------------------------------------------------------------------------------------------------
pub(crate) fn write_terminator<W: Write>(out: &mut W, feature: &FeatureData, cmd: &CommandData) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} {{", cmd.cdecl(&format!("terminator_{}", cmd.stem())))?;
    match cmd.handle.as_str() {
        "VkPhysicalDevice" => write_physical_device_terminator(out, feature, cmd)?,
        "VkInstance" => write_instance_terminator(out, cmd)?,
        "VkDevice" => write_device_terminator(out, cmd)?,
        _ => write_dispatchable_terminator(out, cmd)?,
    }
    writeln!(out, "}}")
}

/// Writes the calls that pass an unwrapped surface to the driver, if the
/// command carries a surface. Control falls through when unwrapping fails.
fn write_surface_unwrap<W: Write>(out: &mut W, cmd: &CommandData, target: &str, args: &[String]) -> io::Result<()> {
    let surface = cmd
        .params
        .iter()
        .position(|p| p.type_name == "VkSurfaceKHR" && p.pointer_depth == 0);
    if let Some(i) = surface {
        let mut unwrapped = args.to_vec();
        unwrapped[i] = String::from("unwrapped_surface");
        writeln!(out, "    VkSurfaceKHR unwrapped_surface = {};", cmd.params[i].name)?;
        writeln!(
            out,
            "    if (VK_SUCCESS == wsi_unwrap_icd_surface(icd_term, &unwrapped_surface)) {{"
        )?;
        write_call(out, "        ", cmd, &format!("{}({})", target, unwrapped.join(", ")), true)?;
        writeln!(out, "    }}")?;
        return Ok(());
    }

    let info = cmd
        .params
        .iter()
        .position(|p| p.type_name == "VkPhysicalDeviceSurfaceInfo2KHR" && p.pointer_depth > 0);
    if let Some(i) = info {
        let p = &cmd.params[i].name;
        let mut unwrapped = args.to_vec();
        unwrapped[i] = String::from("&info_copy");
        writeln!(out, "    if (NULL != {} && VK_NULL_HANDLE != {}->surface) {{", p, p)?;
        writeln!(out, "        VkPhysicalDeviceSurfaceInfo2KHR info_copy = *{};", p)?;
        writeln!(
            out,
            "        if (VK_SUCCESS == wsi_unwrap_icd_surface(icd_term, &info_copy.surface)) {{"
        )?;
        write_call(out, "            ", cmd, &format!("{}({})", target, unwrapped.join(", ")), true)?;
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;
    }
    Ok(())
}

fn write_physical_device_terminator<W: Write>(out: &mut W, feature: &FeatureData, cmd: &CommandData) -> io::Result<()> {
    let p = cmd.first_param();
    let target = format!("icd_term->dispatch.{}", cmd.stem());
    let mut args = cmd.arg_names();
    args[0] = String::from("phys_dev_term->phys_dev");

    writeln!(
        out,
        "    struct loader_physical_device_term *phys_dev_term = (struct loader_physical_device_term *){};",
        p
    )?;
    writeln!(out, "    struct loader_icd_term *icd_term = phys_dev_term->this_icd_term;")?;
    writeln!(out, "    if (NULL == {}) {{", target)?;
    writeln!(out, "        loader_log(icd_term->this_instance, VULKAN_LOADER_ERROR_BIT, 0,")?;
    writeln!(
        out,
        "                   \"ICD associated with VkPhysicalDevice does not support {}\");",
        cmd.stem()
    )?;
    if feature.is_instance_extension() && cmd.returns_result() {
        writeln!(out, "        return VK_ERROR_EXTENSION_NOT_PRESENT;")?;
    } else {
        writeln!(out, "        {}", INTENTIONAL_ABORT)?;
    }
    writeln!(out, "    }}")?;
    write_surface_unwrap(out, cmd, &target, &args)?;
    write_call(out, "    ", cmd, &format!("{}({})", target, args.join(", ")), false)
}

fn write_instance_terminator<W: Write>(out: &mut W, cmd: &CommandData) -> io::Result<()> {
    let p = cmd.first_param();
    let mut args = cmd.arg_names();
    args[0] = String::from("icd_term->instance");
    let call = format!("icd_term->dispatch.{}({})", cmd.stem(), args.join(", "));

    writeln!(out, "    struct loader_instance *inst = loader_get_instance({});", p)?;
    write_invalid_handle(out, "inst", cmd)?;
    if cmd.returns_result() {
        writeln!(out, "    VkResult res = VK_SUCCESS;")?;
    } else if !cmd.returns_void() {
        writeln!(out, "    {} res = 0;", cmd.return_type)?;
    }
    writeln!(
        out,
        "    for (struct loader_icd_term *icd_term = inst->icd_terms; NULL != icd_term; icd_term = icd_term->next) {{"
    )?;
    writeln!(out, "        if (NULL == icd_term->dispatch.{}) {{", cmd.stem())?;
    writeln!(out, "            continue;")?;
    writeln!(out, "        }}")?;
    if cmd.returns_void() {
        writeln!(out, "        {};", call)?;
    } else {
        writeln!(out, "        res = {};", call)?;
    }
    if cmd.returns_result() {
        writeln!(out, "        if (VK_SUCCESS != res) {{")?;
        writeln!(out, "            break;")?;
        writeln!(out, "        }}")?;
    }
    writeln!(out, "    }}")?;
    if !cmd.returns_void() {
        writeln!(out, "    return res;")?;
    }
    Ok(())
}

fn write_device_terminator<W: Write>(out: &mut W, cmd: &CommandData) -> io::Result<()> {
    let p = cmd.first_param();
    let target = format!("dev->loader_dispatch.extension_terminator_dispatch.{}", cmd.stem());
    let mut args = cmd.arg_names();

    writeln!(out, "    struct loader_device *dev;")?;
    writeln!(
        out,
        "    struct loader_icd_term *icd_term = loader_get_icd_and_device({}, &dev);",
        p
    )?;
    writeln!(out, "    if (NULL == icd_term || NULL == dev) {{")?;
    writeln!(
        out,
        "        loader_log(NULL, VULKAN_LOADER_FATAL_ERROR_BIT | VULKAN_LOADER_VALIDATION_ERROR_BIT, 0,"
    )?;
    writeln!(
        out,
        "                   \"{} Terminator: Invalid {} handle. This is likely the result of a \"",
        cmd.stem(),
        p
    )?;
    writeln!(
        out,
        "                   \"layer wrapping {} handles and failing to unwrap them in all functions \"",
        p
    )?;
    writeln!(out, "                   \"[VUID-{}-{}-parameter]\");", cmd.name, p)?;
    writeln!(out, "        {}", INTENTIONAL_ABORT)?;
    writeln!(out, "    }}")?;

    if let Some(debug) = DebugObject::of(cmd) {
        let local = debug.local();
        debug.write_copy(out)?;
        writeln!(out, "    // Physical devices become the driver's physical device.")?;
        writeln!(
            out,
            "    if ({}->objectType == {}) {{",
            debug.param,
            debug.object_type("PHYSICAL_DEVICE")
        )?;
        writeln!(
            out,
            "        struct loader_physical_device_term *phys_dev_term = (struct loader_physical_device_term *)(uintptr_t){}->{};",
            debug.param, debug.field
        )?;
        writeln!(
            out,
            "        {}.{} = (uint64_t)(uintptr_t)phys_dev_term->phys_dev;",
            local, debug.field
        )?;
        writeln!(out, "    // Surfaces become the surface the driver created, if it made one.")?;
        writeln!(
            out,
            "    }} else if ({}->objectType == {}) {{",
            debug.param,
            debug.object_type("SURFACE_KHR")
        )?;
        writeln!(
            out,
            "        if (NULL != dev && NULL != dev->loader_dispatch.core_dispatch.CreateSwapchainKHR) {{"
        )?;
        writeln!(
            out,
            "            VkIcdSurface *icd_surface = (VkIcdSurface *)(uintptr_t){}->{};",
            debug.param, debug.field
        )?;
        writeln!(out, "            if (NULL != icd_surface->real_icd_surfaces) {{")?;
        writeln!(
            out,
            "                {}.{} = (uint64_t)icd_surface->real_icd_surfaces[icd_term->icd_index];",
            local, debug.field
        )?;
        writeln!(out, "            }}")?;
        writeln!(out, "        }}")?;
        writeln!(out, "    // Instances become the driver's instance.")?;
        writeln!(
            out,
            "    }} else if ({}->objectType == {}) {{",
            debug.param,
            debug.object_type("INSTANCE")
        )?;
        writeln!(
            out,
            "        {}.{} = (uint64_t)(uintptr_t)icd_term->instance;",
            local, debug.field
        )?;
        writeln!(out, "    }}")?;
        writeln!(out, "    // The driver may not support the function even when a layer does.")?;
        writeln!(out, "    if (NULL == {}) {{", target)?;
        if cmd.returns_result() {
            writeln!(out, "        return VK_SUCCESS;")?;
        } else {
            writeln!(out, "        return;")?;
        }
        writeln!(out, "    }}")?;
        args[1] = format!("&{}", local);
        return write_call(out, "    ", cmd, &format!("{}({})", target, args.join(", ")), false);
    }

    writeln!(out, "    if (NULL == {}) {{", target)?;
    writeln!(out, "        loader_log(icd_term->this_instance, VULKAN_LOADER_ERROR_BIT, 0,")?;
    writeln!(
        out,
        "                   \"ICD associated with {} does not support {}\");",
        p,
        cmd.stem()
    )?;
    writeln!(out, "        {}", INTENTIONAL_ABORT)?;
    writeln!(out, "    }}")?;
    write_surface_unwrap(out, cmd, &target, &args)?;
    write_call(out, "    ", cmd, &format!("{}({})", target, args.join(", ")), false)
}

fn write_dispatchable_terminator<W: Write>(out: &mut W, cmd: &CommandData) -> io::Result<()> {
    let p = cmd.first_param();
    let target = format!("dispatch_table->extension_terminator_dispatch.{}", cmd.stem());
    let call = format!("{}({})", target, cmd.arg_names().join(", "));

    writeln!(
        out,
        "    const struct loader_dev_dispatch_table *dispatch_table = loader_get_dev_dispatch({});",
        p
    )?;
    write_invalid_handle(out, "dispatch_table", cmd)?;
    writeln!(out, "    // Only call down if the device supports the function")?;
    writeln!(out, "    if (NULL != {}) {{", target)?;
    write_call(out, "        ", cmd, &call, false)?;
    writeln!(out, "    }}")?;
    if cmd.returns_result() {
        writeln!(out, "    return VK_SUCCESS;")?;
    } else if !cmd.returns_void() {
        writeln!(out, "    return ({})0;", cmd.return_type)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loader::test::decl;
    use crate::types::{Decl, ExtensionType};

    fn extension(name: &str, ext_type: ExtensionType) -> FeatureData {
        FeatureData {
            name: String::from(name),
            version: None,
            ext_type: Some(ext_type),
            protect: None,
            name_define: None,
            commands: Vec::new(),
        }
    }

    fn command(name: &str, level: CommandLevel, ret: &str, params: Vec<Decl>) -> CommandData {
        CommandData {
            name: String::from(name),
            canonical: String::from(name),
            level,
            handle: params[0].type_name.clone(),
            protect: None,
            return_type: String::from(ret),
            params,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn position(text: &str, needle: &str) -> usize {
        text.find(needle).unwrap_or_else(|| panic!("missing `{}` in:\n{}", needle, text))
    }

    #[test]
    fn test_surface_unwrap_then_fallback() {
        let feature = extension("VK_EXT_full_screen_exclusive", ExtensionType::Device);
        let cmd = command(
            "vkGetPhysicalDeviceSurfacePresentModes2EXT",
            CommandLevel::PhysicalDevice,
            "VkResult",
            vec![
                decl("VkPhysicalDevice", "physicalDevice", "VkPhysicalDevice physicalDevice"),
                decl("VkSurfaceKHR", "surface", "VkSurfaceKHR surface"),
                decl("uint32_t", "pCount", "uint32_t* pCount"),
            ],
        );
        let text = render(|out| write_terminator(out, &feature, &cmd));
        let unwrap = position(&text, "wsi_unwrap_icd_surface(icd_term, &unwrapped_surface)");
        let unwrapped_call = position(
            &text,
            "return icd_term->dispatch.GetPhysicalDeviceSurfacePresentModes2EXT(phys_dev_term->phys_dev, unwrapped_surface, pCount);",
        );
        let plain_call = position(
            &text,
            "return icd_term->dispatch.GetPhysicalDeviceSurfacePresentModes2EXT(phys_dev_term->phys_dev, surface, pCount);",
        );
        assert!(unwrap < unwrapped_call);
        assert!(unwrapped_call < plain_call);
        // Device extensions abort on a missing driver entry point.
        assert!(text.contains(INTENTIONAL_ABORT));
        assert!(!text.contains("VK_ERROR_EXTENSION_NOT_PRESENT"));
    }

    #[test]
    fn test_instance_extension_missing_entry_point() {
        let feature = extension("VK_KHR_get_physical_device_properties2", ExtensionType::Instance);
        let cmd = command(
            "vkGetPhysicalDeviceImageFormatProperties2KHR",
            CommandLevel::PhysicalDevice,
            "VkResult",
            vec![
                decl("VkPhysicalDevice", "physicalDevice", "VkPhysicalDevice physicalDevice"),
                decl("VkPhysicalDeviceImageFormatInfo2", "pInfo", "const VkPhysicalDeviceImageFormatInfo2* pInfo"),
            ],
        );
        let text = render(|out| write_terminator(out, &feature, &cmd));
        assert!(text.contains("        return VK_ERROR_EXTENSION_NOT_PRESENT;\n"));
    }

    #[test]
    fn test_debug_object_name_rewrite() {
        let feature = extension("VK_EXT_debug_utils", ExtensionType::Instance);
        let cmd = command(
            "vkSetDebugUtilsObjectNameEXT",
            CommandLevel::Device,
            "VkResult",
            vec![
                decl("VkDevice", "device", "VkDevice device"),
                decl(
                    "VkDebugUtilsObjectNameInfoEXT",
                    "pNameInfo",
                    "const VkDebugUtilsObjectNameInfoEXT* pNameInfo",
                ),
            ],
        );
        let text = render(|out| write_terminator(out, &feature, &cmd));
        assert!(text.contains("memcpy(&local_pNameInfo, pNameInfo, sizeof(VkDebugUtilsObjectNameInfoEXT));"));
        let phys = position(&text, "pNameInfo->objectType == VK_OBJECT_TYPE_PHYSICAL_DEVICE");
        let surface = position(&text, "pNameInfo->objectType == VK_OBJECT_TYPE_SURFACE_KHR");
        let instance = position(&text, "pNameInfo->objectType == VK_OBJECT_TYPE_INSTANCE");
        assert!(phys < surface && surface < instance);
        assert!(text.contains("local_pNameInfo.objectHandle = (uint64_t)(uintptr_t)icd_term->instance;"));
        assert!(text.contains(
            "return dev->loader_dispatch.extension_terminator_dispatch.SetDebugUtilsObjectNameEXT(device, &local_pNameInfo);"
        ));

        let text = render(|out| write_trampoline(out, &feature, &cmd));
        assert!(text.contains("local_pNameInfo.objectHandle = (uint64_t)(uintptr_t)phys_dev_tramp->phys_dev;"));
        assert!(text.contains("    if (disp->SetDebugUtilsObjectNameEXT != NULL) {\n"));
        assert!(text.contains("        return VK_SUCCESS;\n"));
    }

    #[test]
    fn test_debug_marker_object_types() {
        let feature = extension("VK_EXT_debug_marker", ExtensionType::Device);
        let cmd = command(
            "vkDebugMarkerSetObjectTagEXT",
            CommandLevel::Device,
            "VkResult",
            vec![
                decl("VkDevice", "device", "VkDevice device"),
                decl(
                    "VkDebugMarkerObjectTagInfoEXT",
                    "pTagInfo",
                    "const VkDebugMarkerObjectTagInfoEXT* pTagInfo",
                ),
            ],
        );
        let text = render(|out| write_terminator(out, &feature, &cmd));
        assert!(text.contains("pTagInfo->objectType == VK_DEBUG_REPORT_OBJECT_TYPE_SURFACE_KHR_EXT"));
        assert!(text.contains("local_pTagInfo.object = (uint64_t)(uintptr_t)icd_term->instance;"));
    }

    #[test]
    fn test_physical_device_trampoline() {
        let feature = extension("VK_EXT_tooling_info", ExtensionType::Device);
        let cmd = command(
            "vkGetPhysicalDeviceToolPropertiesEXT",
            CommandLevel::PhysicalDevice,
            "VkResult",
            vec![
                decl("VkPhysicalDevice", "physicalDevice", "VkPhysicalDevice physicalDevice"),
                decl("uint32_t", "pToolCount", "uint32_t* pToolCount"),
            ],
        );
        let text = render(|out| write_trampoline(out, &feature, &cmd));
        assert!(text.contains("loader_get_instance_layer_dispatch(physicalDevice);"));
        assert!(text.contains("\"vkGetPhysicalDeviceToolPropertiesEXT: Invalid physicalDevice \""));
        assert!(text.contains("\"[VUID-vkGetPhysicalDeviceToolPropertiesEXT-physicalDevice-parameter]\");"));
        assert!(text.contains("return disp->GetPhysicalDeviceToolPropertiesEXT(unwrapped_phys_dev, pToolCount);"));
    }

    #[test]
    fn test_instance_trampoline() {
        let feature = extension("VK_EXT_debug_report", ExtensionType::Instance);
        let cmd = command(
            "vkDebugReportMessageEXT",
            CommandLevel::Instance,
            "void",
            vec![
                decl("VkInstance", "instance", "VkInstance instance"),
                decl("VkDebugReportFlagsEXT", "flags", "VkDebugReportFlagsEXT flags"),
                decl("const char", "pMessage", "const char* pMessage"),
            ],
        );
        let text = render(|out| write_trampoline(out, &feature, &cmd));
        let lookup = position(&text, "    struct loader_instance *inst = loader_get_instance(instance);
");
        let check = position(&text, "    if (NULL == inst) {
");
        let vuid = position(&text, "\"[VUID-vkDebugReportMessageEXT-instance-parameter]\");");
        let call = position(&text, "    inst->disp->layer_inst_disp.DebugReportMessageEXT(instance, flags, pMessage);
");
        assert!(lookup < check && check < vuid && vuid < call);
        assert!(!text.contains("loader_get_instance_layer_dispatch"));
        assert!(!text.contains("disp->DebugReportMessageEXT"));
    }

    #[test]
    fn test_queue_terminator() {
        let feature = extension("VK_EXT_debug_utils", ExtensionType::Instance);
        let cmd = command(
            "vkQueueEndDebugUtilsLabelEXT",
            CommandLevel::Device,
            "void",
            vec![decl("VkQueue", "queue", "VkQueue queue")],
        );
        assert!(has_terminator(&feature, &cmd));
        let text = render(|out| write_terminator(out, &feature, &cmd));
        assert!(text.contains("loader_get_dev_dispatch(queue);"));
        assert!(text.contains("        dispatch_table->extension_terminator_dispatch.QueueEndDebugUtilsLabelEXT(queue);\n"));
        assert!(!text.contains("return"));
    }

    #[test]
    fn test_hand_written_entry_points() {
        let wsi = extension("VK_KHR_swapchain", ExtensionType::Device);
        let cmd = command(
            "vkCreateSwapchainKHR",
            CommandLevel::Device,
            "VkResult",
            vec![decl("VkDevice", "device", "VkDevice device")],
        );
        assert!(!has_trampoline(&wsi, &cmd));

        let utils = extension("VK_EXT_debug_utils", ExtensionType::Instance);
        let cmd = command(
            "vkCreateDebugUtilsMessengerEXT",
            CommandLevel::Instance,
            "VkResult",
            vec![decl("VkInstance", "instance", "VkInstance instance")],
        );
        assert!(!has_trampoline(&utils, &cmd));
    }
}
